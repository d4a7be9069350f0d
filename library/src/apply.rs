// This file's job is to apply a downloaded package archive: extract it next
// to itself and merge the extracted tree over the installation.
//
// The merge only ever creates directories and overwrites files. Files left
// over from older add-on versions stay where they are, and a failure part
// way through leaves a partially merged tree behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use crate::file_errors::{FileOperation, IoResultExt};
use crate::PatchError;

/// A retrieved package and the folder it extracts into (the archive's own
/// directory joined with its file stem).
///
/// The extraction folder is removed when the archive is dropped, but only if
/// this archive created it.
#[derive(Debug)]
pub struct PatchArchive {
    archive_path: PathBuf,
    extract_dir: PathBuf,
    owns_extract_dir: bool,
}

impl PatchArchive {
    pub fn new(archive_path: &Path) -> anyhow::Result<Self> {
        if !archive_path.is_file() {
            bail!(PatchError::PackageMissing(
                archive_path.display().to_string()
            ));
        }
        let stem = archive_path
            .file_stem()
            .with_context(|| format!("Package path has no file name: {:?}", archive_path))?;
        let parent = archive_path
            .parent()
            .with_context(|| format!("Package path has no parent: {:?}", archive_path))?;
        Ok(Self {
            archive_path: archive_path.to_path_buf(),
            extract_dir: parent.join(stem),
            owns_extract_dir: false,
        })
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Extracts the archive and returns the directory to merge from.
    ///
    /// Packages are sometimes built with all their contents inside a single
    /// folder named like the archive (`patch.zip` -> `patch/...`). In that
    /// case the inner folder is the merge source.
    ///
    /// Fails if the extraction folder already exists and wasn't created by
    /// an earlier `extract` on this archive.
    pub fn extract(&mut self) -> anyhow::Result<PathBuf> {
        patcher_info!(
            "Extracting {:?} into {:?}",
            self.archive_path,
            self.extract_dir
        );
        if self.extract_dir.exists() {
            if !self.owns_extract_dir {
                bail!(PatchError::InvalidState(format!(
                    "Extraction folder {:?} already exists",
                    self.extract_dir
                )));
            }
            fs::remove_dir_all(&self.extract_dir)
                .with_file_context(FileOperation::DeleteDir, &self.extract_dir)?;
        }
        self.owns_extract_dir = true;
        extract_zip(&self.archive_path, &self.extract_dir)?;

        let mut entries = fs::read_dir(&self.extract_dir)
            .with_file_context(FileOperation::ReadDir, &self.extract_dir)?
            .collect::<io::Result<Vec<_>>>()
            .with_file_context(FileOperation::ReadDir, &self.extract_dir)?;
        if entries.len() == 1 {
            let only = entries.remove(0);
            let wrapped = only.path();
            if wrapped.is_dir() && self.extract_dir.file_name() == Some(only.file_name().as_os_str()) {
                patcher_debug!("Package contents are wrapped in {:?}", wrapped);
                return Ok(wrapped);
            }
        }
        Ok(self.extract_dir.clone())
    }

    /// Extracts the archive and merges it into `install_dir`.
    pub fn apply_to(&mut self, install_dir: &Path) -> anyhow::Result<()> {
        let source = self.extract()?;
        patcher_info!("Merging {:?} into {:?}", source, install_dir);
        merge_directories(&source, install_dir)
    }
}

impl Drop for PatchArchive {
    fn drop(&mut self) {
        if self.owns_extract_dir && self.extract_dir.exists() {
            if let Err(err) = fs::remove_dir_all(&self.extract_dir) {
                patcher_warn!(
                    "Failed to clean up {:?}, ignoring: {}",
                    self.extract_dir,
                    err
                );
            }
        }
    }
}

/// Applies the package at `archive_path` to `install_dir`.
pub fn apply_patch(archive_path: &Path, install_dir: &Path) -> anyhow::Result<()> {
    PatchArchive::new(archive_path)?.apply_to(install_dir)
}

fn extract_zip(archive_path: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let file =
        fs::File::open(archive_path).with_file_context(FileOperation::ReadFile, archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to open package archive {:?}", archive_path))?;
    fs::create_dir_all(out_dir).with_file_context(FileOperation::CreateDir, out_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                patcher_warn!("Skipping package entry outside the archive: {}", entry.name());
                continue;
            }
        };
        let out_path = out_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).with_file_context(FileOperation::CreateDir, &out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).with_file_context(FileOperation::CreateDir, parent)?;
            }
            let mut outfile = fs::File::create(&out_path)
                .with_file_context(FileOperation::CreateFile, &out_path)?;
            io::copy(&mut entry, &mut outfile)
                .with_file_context(FileOperation::WriteFile, &out_path)?;
        }
    }
    Ok(())
}

/// Recursively copies `src` over `dst`: directories first (created when
/// missing), then files (overwriting). Nothing in `dst` is ever deleted.
pub fn merge_directories(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(src).with_file_context(FileOperation::ReadDir, src)? {
        let entry = entry.with_file_context(FileOperation::ReadDir, src)?;
        if entry
            .file_type()
            .with_file_context(FileOperation::ReadDir, src)?
            .is_dir()
        {
            dirs.push(entry);
        } else {
            files.push(entry);
        }
    }

    for dir in dirs {
        let dst_dir = dst.join(dir.file_name());
        if !dst_dir.is_dir() {
            fs::create_dir(&dst_dir).with_file_context(FileOperation::CreateDir, &dst_dir)?;
        }
        merge_directories(&dir.path(), &dst_dir)?;
    }

    for file in files {
        let dst_file = dst.join(file.file_name());
        fs::copy(file.path(), &dst_file).with_file_context(FileOperation::CopyFile, &dst_file)?;
    }
    Ok(())
}
