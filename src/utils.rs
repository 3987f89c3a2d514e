//! Utility functions for string handling, date parsing and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe string truncation for log previews of Japanese text
//! - Parsing of `YYYY年M月D日` dates for ordering articles
//! - File system validation for output directories

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static JA_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)年(\d+)月(\d+)日").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters (not bytes, so multi-byte
/// text is never split) with an ellipsis and the number of dropped
/// characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("あいうえお", 2), "あい…(+3 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => {
            let dropped = s[cut..].chars().count();
            format!("{}…(+{} chars)", &s[..cut], dropped)
        }
    }
}

/// Parse the first `YYYY年M月D日` date found in `s`.
///
/// Returns `None` when no such date is present or it is not a real day.
pub fn parse_japanese_date(s: &str) -> Option<NaiveDate> {
    let caps = JA_DATE_RE.captures(s)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = format!("{}/.__write_check__", path.trim_end_matches('/'));
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "あ".repeat(60);
        let result = truncate_for_log(&s, 50);
        assert!(result.starts_with(&"あ".repeat(50)));
        assert!(result.ends_with("…(+10 chars)"));
    }

    #[test]
    fn test_parse_japanese_date() {
        assert_eq!(
            parse_japanese_date("2025年9月1日"),
            NaiveDate::from_ymd_opt(2025, 9, 1)
        );
        assert_eq!(
            parse_japanese_date("更新：2024年12月31日 18時"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(parse_japanese_date("2025年2月30日"), None);
        assert_eq!(parse_japanese_date("2025-09-01"), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }
}
