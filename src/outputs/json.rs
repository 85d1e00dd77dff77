//! JSON output for downstream consumers.
//!
//! Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-10-05/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! Each file holds `{"articles": [...]}`, the same envelope the HTTP front
//! end returns.

use crate::models::ArticlesResponse;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `articles` inside the `{"articles": [...]}` envelope.
pub fn to_json<T: Serialize>(articles: Vec<T>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ArticlesResponse { articles })
}

/// Write `articles` to `{json_output_dir}/{local_date}/{edition}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(%json_output_dir, %local_date, %edition))]
pub async fn write_articles<T: Serialize>(
    articles: Vec<T>,
    json_output_dir: &str,
    local_date: &str,
    edition: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let count = articles.len();
    let json = to_json(articles)?;

    let dir = PathBuf::from(json_output_dir).join(local_date);
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dir.join(format!("{edition}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), count, "Wrote JSON articles file");
    Ok(path)
}
