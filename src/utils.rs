//! Utility functions for input validation and file system checks.

use chrono::NaiveDate;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Validate a compact `YYYYMMDD` date string as the Article Search API
/// expects it.
///
/// # Errors
///
/// Returns an error naming the offending value if it is not a real calendar
/// date in compact form.
pub fn validate_compact_date(date: &str) -> Result<(), Box<dyn Error>> {
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .map(|_| ())
        .map_err(|e| format!("invalid date `{date}` (expected YYYYMMDD): {e}").into())
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
