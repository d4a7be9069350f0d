// This module provides enhanced error messages for file operations.
// Patching writes into a game installation the user may not own, or that
// the game itself may still be holding open, so a bare io::Error is rarely
// enough for a user to act on.

use std::io::ErrorKind;
use std::path::Path;

/// Describes the type of file operation that failed.
#[derive(Debug, Clone, Copy)]
pub enum FileOperation {
    CreateDir,
    CreateFile,
    WriteFile,
    ReadFile,
    ReadDir,
    CopyFile,
    DeleteDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::CreateDir => write!(f, "create directory"),
            FileOperation::CreateFile => write!(f, "create file"),
            FileOperation::WriteFile => write!(f, "write to file"),
            FileOperation::ReadFile => write!(f, "read file"),
            FileOperation::ReadDir => write!(f, "list directory"),
            FileOperation::CopyFile => write!(f, "copy file"),
            FileOperation::DeleteDir => write!(f, "delete directory"),
        }
    }
}

/// Creates an enhanced error message for a file operation failure.
///
/// The message names the operation and the path, and appends a hint about
/// the likely cause when the error kind suggests one.
pub fn enhance_io_error(error: &std::io::Error, operation: FileOperation, path: &Path) -> String {
    let base_message = format!("Failed to {} '{}': {}", operation, path.display(), error);

    let hint = get_error_hint(error, operation);

    if hint.is_empty() {
        base_message
    } else {
        format!("{}\nPossible cause: {}", base_message, hint)
    }
}

fn get_error_hint(error: &std::io::Error, operation: FileOperation) -> String {
    match error.kind() {
        ErrorKind::PermissionDenied => get_permission_denied_hint(operation),
        ErrorKind::NotFound => get_not_found_hint(operation),
        ErrorKind::StorageFull => "The disk is full. Free up space and try again.".to_string(),
        ErrorKind::ReadOnlyFilesystem => "The filesystem is mounted as read-only.".to_string(),
        _ => error.raw_os_error().map(get_os_error_hint).unwrap_or_default(),
    }
}

fn get_permission_denied_hint(operation: FileOperation) -> String {
    match operation {
        FileOperation::CreateDir
        | FileOperation::CreateFile
        | FileOperation::WriteFile
        | FileOperation::CopyFile => {
            "The patcher may not have write access to the installation. \
            Try running it as a user allowed to install games on this computer."
        }
        FileOperation::ReadFile | FileOperation::ReadDir => {
            "The patcher may not have read access to this location."
        }
        FileOperation::DeleteDir => "The patcher may not have permission to delete this item.",
    }
    .to_string()
}

fn get_not_found_hint(operation: FileOperation) -> String {
    match operation {
        FileOperation::CreateDir | FileOperation::CreateFile | FileOperation::WriteFile => {
            "The parent directory may not exist.".to_string()
        }
        FileOperation::CopyFile => {
            "The source file or destination directory may not exist.".to_string()
        }
        _ => "The file or directory does not exist.".to_string(),
    }
}

fn get_os_error_hint(os_error: i32) -> String {
    #[cfg(windows)]
    {
        // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
        if os_error == 32 || os_error == 33 {
            return "The file is in use. Close the game and try again.".to_string();
        }
    }

    #[cfg(not(windows))]
    {
        // ETXTBSY
        if os_error == 26 {
            return "The file is in use. Close the game and try again.".to_string();
        }
    }

    match os_error {
        28 => "The disk is full (ENOSPC). Free up space and try again.".to_string(),
        30 => "The filesystem is mounted as read-only (EROFS).".to_string(),
        _ => String::new(),
    }
}

/// A trait extension for adding enhanced context to IO Results.
pub trait IoResultExt<T> {
    /// Adds enhanced error context to an IO operation result.
    fn with_file_context(self, operation: FileOperation, path: &Path) -> anyhow::Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_file_context(self, operation: FileOperation, path: &Path) -> anyhow::Result<T> {
        self.map_err(|e| {
            let enhanced_message = enhance_io_error(&e, operation, path);
            anyhow::Error::new(e).context(enhanced_message)
        })
    }
}
