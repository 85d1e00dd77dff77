//! Small helpers shared by the binary's outer layers.
//!
//! - Edition naming for output files
//! - Log-friendly truncation
//! - Truncated-JSON detection for model replies
//! - Output directory validation

use chrono::{Local, NaiveTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Edition name for the current local time.
pub fn time_of_day() -> &'static str {
    let which = edition_for(Local::now().time());
    tracing::debug!(%which, "Computed time_of_day");
    which
}

/// `"morning"` before 08:00, `"afternoon"` before 16:00, else `"evening"`.
pub fn edition_for(tod: NaiveTime) -> &'static str {
    match tod.hour() {
        0..=7 => "morning",
        8..=15 => "afternoon",
        _ => "evening",
    }
}

/// Truncate a string for logging, appending the number of dropped bytes.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep; the cut moves back to the
///   nearest char boundary
///
/// # Returns
///
/// `s` unchanged if it fits, otherwise the kept prefix with
/// `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Whether a serde_json error means the input ended early.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Create `path` if needed and check that files can be written into it.
///
/// Runs before any scraping so a bad `--json-output-dir` fails fast.
///
/// # Errors
///
/// Returns the IO error from creating the directory or the probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
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
