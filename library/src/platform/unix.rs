use std::fs::DirEntry;
use std::path::{Path, PathBuf};

// Virtual filesystems which can't hold an installation and are expensive
// (or unbounded) to list.
const SYSTEM_DIRS: &[&str] = &["/proc", "/sys", "/dev", "/run"];

pub fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

/// Dot-files are hidden by convention.
pub fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

pub fn is_system_dir(path: &Path) -> bool {
    SYSTEM_DIRS.iter().any(|dir| path == Path::new(dir))
}
