//! Shared helpers for database location and timestamp conversion.
//!
//! These functions are reused across the HTTP server, the CLI and the TUI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;

/// Seconds in one UTC day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/cognicanvas/canvas.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("cognicanvas").join("canvas.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Current time truncated to whole seconds, the resolution timestamps are stored at.
pub fn now_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Converts stored Unix seconds back into a UTC timestamp.
pub fn from_unix_seconds(seconds: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp(seconds)
}

/// Day number (days since 1970-01-01 UTC) of a timestamp.
pub fn day_number(at: OffsetDateTime) -> i64 {
    at.unix_timestamp().div_euclid(SECONDS_PER_DAY)
}

/// Formats a timestamp as `YYYY-MM-DD` for display.
pub fn format_date(at: OffsetDateTime) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    at.format(&format)
        .unwrap_or_else(|_| "????-??-??".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn get_database_path_returns_valid_path() {
        let path = get_database_path().unwrap();
        assert!(path.to_string_lossy().contains("cognicanvas"));
        assert!(path.to_string_lossy().ends_with("canvas.db"));
    }

    #[test]
    fn ensure_database_directory_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("a").join("b").join("canvas.db");

        ensure_database_directory(&db_path).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }

    #[test]
    fn ensure_database_directory_accepts_bare_file_name() {
        assert!(ensure_database_directory(Path::new("canvas.db")).is_ok());
    }

    #[test]
    fn day_number_counts_utc_days() {
        assert_eq!(day_number(datetime!(1970-01-01 23:59:59 UTC)), 0);
        assert_eq!(day_number(datetime!(1970-01-02 00:00:00 UTC)), 1);
        assert_eq!(day_number(datetime!(1969-12-31 12:00:00 UTC)), -1);
    }

    #[test]
    fn format_date_is_iso_day() {
        assert_eq!(format_date(datetime!(2024-03-05 10:00:00 UTC)), "2024-03-05");
    }

    #[test]
    fn from_unix_seconds_roundtrips() {
        let at = from_unix_seconds(1_700_000_000).unwrap();
        assert_eq!(at.unix_timestamp(), 1_700_000_000);
    }
}
