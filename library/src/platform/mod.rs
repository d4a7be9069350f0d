// Platform-specific answers to "where can an installation live" and
// "should the search look inside this directory".

#[cfg(windows)]
mod windows;
#[cfg(not(windows))]
mod unix;

#[cfg(windows)]
pub use windows::*;
#[cfg(not(windows))]
pub use unix::*;

use std::path::PathBuf;

use sysinfo::Disks;

/// Every mounted filesystem root, deduplicated, in the order the OS reports
/// them. Falls back to the platform's default roots if none are reported.
pub fn filesystem_roots() -> Vec<PathBuf> {
    let disks = Disks::new_with_refreshed_list();
    let mut roots = default_roots();
    for disk in disks.list() {
        let mount_point = disk.mount_point().to_path_buf();
        if !roots.contains(&mount_point) {
            roots.push(mount_point);
        }
    }
    patcher_debug!("Filesystem roots: {:?}", roots);
    roots
}
