// This file's job is to find where the target application is installed.
//
// Installs aren't registered anywhere we can ask, so we guess: walk every
// filesystem root a few levels deep looking for directories with the right
// name, then keep only the ones that contain the marker files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PatcherConfig;
use crate::platform;
use crate::PatchError;

/// An absolute path which contained both marker files when it was created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstallationPath(PathBuf);

impl InstallationPath {
    /// Validates `path` and wraps it. Relative paths are made absolute
    /// against the current directory.
    pub fn new(path: &Path, config: &PatcherConfig) -> Result<Self, PatchError> {
        let invalid = || {
            PatchError::InvalidArgument("install_dir".to_string(), path.display().to_string())
        };
        let absolute = std::path::absolute(path).map_err(|_| invalid())?;
        if !is_installation_dir(&absolute, config) {
            return Err(invalid());
        }
        Ok(Self(absolute))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for InstallationPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// True iff `path` is a directory holding both the binary marker and the
/// product metadata file. Other contents don't matter.
pub fn is_installation_dir(path: &Path, config: &PatcherConfig) -> bool {
    if !path.is_dir() {
        return false;
    }

    config.binary_marker_path(path).is_file() && config.product_metadata_path(path).is_file()
}

/// Searches every mounted filesystem for installations.
pub fn find_candidates(config: &PatcherConfig) -> Vec<InstallationPath> {
    find_candidates_in(&platform::filesystem_roots(), config)
}

/// Searches below `roots` for installations. Results are sorted and free of
/// duplicates (roots may overlap, e.g. "/" and "/home").
pub fn find_candidates_in(roots: &[PathBuf], config: &PatcherConfig) -> Vec<InstallationPath> {
    let mut found: Vec<InstallationPath> = roots
        .iter()
        .flat_map(|root| {
            find_subdirectories(root, &config.target_dir_name, config.search_depth)
        })
        .filter(|dir| is_installation_dir(dir, config))
        .map(InstallationPath)
        .collect();
    found.sort();
    found.dedup();
    patcher_info!("Found {} installation candidate(s): {:?}", found.len(), found);
    found
}

/// Every directory at most `depth` levels below `root` whose name matches
/// `name` case-insensitively.
///
/// A matching directory is still descended into, since nested layouts like
/// `Games/Hearthstone/Hearthstone` happen on secondary drives. Hidden
/// directories can match but are never descended into. Directories we can't
/// list are treated as empty. Symlinks are ignored.
fn find_subdirectories(root: &Path, name: &str, depth: usize) -> Vec<PathBuf> {
    let wanted = name.to_lowercase();
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), depth)];

    while let Some((dir, remaining)) = pending.pop() {
        if remaining == 0 {
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                patcher_debug!("Skipping {:?}: {}", dir, err);
                continue;
            }
        };

        for entry in entries.flatten() {
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                _ => continue,
            }

            let path = entry.path();
            if entry.file_name().to_string_lossy().to_lowercase() == wanted {
                found.push(path.clone());
            }

            if !platform::is_hidden(&entry) && !platform::is_system_dir(&path) {
                pending.push((path, remaining - 1));
            }
        }
    }

    found
}
