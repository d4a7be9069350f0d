// This is a required file for rust libraries which declares what files are
// part of the library and what interfaces are public from the library.

#[macro_use]
mod logging_macros;

// Declare other .rs file/module exists, but make them private.
mod apply;
mod config;
mod file_errors;
mod locator;
mod logging;
mod network;
mod platform;
mod updater;
mod versions;
mod yaml;

#[cfg(test)]
mod test_utils;

pub use self::apply::{apply_patch, merge_directories, PatchArchive};
pub use self::config::{
    PatcherConfig, ADDON_VERSION_FILE_NAME, PACKAGE_FILE_NAME, PATCHER_VERSION,
    PATCHER_VERSION_FILE_NAME,
};
pub use self::file_errors::{FileOperation, IoResultExt};
pub use self::locator::{find_candidates, find_candidates_in, is_installation_dir, InstallationPath};
pub use self::logging::{init_logging, write_error_log, DEFAULT_ERROR_LOG};
pub use self::network::{ArtifactRetriever, DownloadFileFn, HttpRetriever, NetworkHooks};
pub use self::platform::filesystem_roots;
pub use self::versions::{is_addon_outdated, parse_app_version, AddonVersions, VersionResolver};

// Take all public items from the updater namespace and make them public.
pub use self::updater::*;

#[cfg(test)]
extern crate tempdir;
