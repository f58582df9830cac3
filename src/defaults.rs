//! Default values shared by the CLI commands.

use std::path::PathBuf;

/// Host serving raw file contents for `.gitmodules` probes.
///
/// Overridden by `scan --raw-base` or `ARCHIVE_OVERRIDE_RAW_BASE`.
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// Upper bound on one `.gitmodules` probe, in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Upper bound on one git invocation or archive download, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 300;

/// Packaging worker pool size.
pub const JOBS: usize = 4;

/// Parent directory for per-module workspaces.
///
/// Overridden by `package --workdir` or `ARCHIVE_OVERRIDE_WORKDIR`.
pub fn work_root() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_root_is_temp_dir() {
        assert_eq!(work_root(), std::env::temp_dir());
    }
}
