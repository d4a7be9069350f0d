// This file's job is to set up logging for the patcher and to record fatal
// errors somewhere the user can send us after the console has closed.

use std::fs;
use std::path::Path;

#[cfg(test)]
use mock_instant::global::SystemTime;

#[cfg(not(test))]
use std::time::SystemTime;

use crate::file_errors::{FileOperation, IoResultExt};

/// Where fatal errors are written when the caller doesn't pick a path.
pub const DEFAULT_ERROR_LOG: &str = "errors.log";

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
pub fn init_logging() {
    let init_result = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init();
    match init_result {
        Ok(_) => patcher_debug!("Logging initialized"),
        // A logger is already installed (e.g. init_logging was called twice).
        Err(e) => patcher_debug!("Logging already initialized: {}", e),
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub fn init_logging() {
    // Nothing to do on other platforms.
}

/// The number of seconds since the Unix epoch. Returns 0 if the system clock is set before the
/// Unix epoch.
pub(crate) fn unix_timestamp() -> u64 {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => 0,
    }
}

/// Overwrites `path` with a timestamp line followed by the full error chain.
pub fn write_error_log(path: &Path, error: &anyhow::Error) -> anyhow::Result<()> {
    let contents = format!("{}\n{:?}\n", unix_timestamp(), error);
    fs::write(path, contents).with_file_context(FileOperation::WriteFile, path)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mock_instant::global::MockClock;
    use serial_test::serial;
    use tempdir::TempDir;

    #[serial]
    #[test]
    fn returns_duration_since_unix_epoch() {
        MockClock::set_system_time(Duration::from_secs(123));
        assert_eq!(super::unix_timestamp(), 123);
    }

    #[serial]
    #[test]
    fn error_log_contains_timestamp_and_chain() {
        MockClock::set_system_time(Duration::from_secs(1700000000));
        let tmp_dir = TempDir::new("error_log").unwrap();
        let path = tmp_dir.path().join("errors.log");

        let error = anyhow::anyhow!("connection reset").context("Failed to download patch.zip");
        super::write_error_log(&path, &error).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("1700000000"));
        assert!(contents.contains("Failed to download patch.zip"));
        assert!(contents.contains("connection reset"));
    }

    #[serial]
    #[test]
    fn error_log_is_overwritten() {
        let tmp_dir = TempDir::new("error_log").unwrap();
        let path = tmp_dir.path().join("errors.log");
        std::fs::write(&path, "stale error from a previous run").unwrap();

        super::write_error_log(&path, &anyhow::anyhow!("fresh")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
        assert!(contents.contains("fresh"));
    }

    #[test]
    fn error_log_reports_unwritable_path() {
        let tmp_dir = TempDir::new("error_log").unwrap();
        let path = tmp_dir.path().join("missing_dir").join("errors.log");
        let result = super::write_error_log(&path, &anyhow::anyhow!("boom"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to write to file"));
    }

    #[serial]
    #[test]
    fn init_logging_twice_does_not_panic() {
        super::init_logging();
        super::init_logging();
    }
}
