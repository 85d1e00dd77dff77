//! Scraper configuration.
//!
//! Everything has a default matching the live NFL.com and ESPN markup, so a
//! config file is only needed to point the scraper somewhere else or to
//! enable enrichment. Files are YAML:
//!
//! ```yaml
//! espn:
//!   category_label: NFL
//! timeouts:
//!   listing_wait_ms: 8000
//! enrichment:
//!   endpoint: http://localhost:1234/v1
//!   model: qwen2.5-7b-instruct
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub nfl: NflSource,
    pub espn: EspnSource,
    pub timeouts: Timeouts,
    /// User-Agent sent with static fetches.
    pub user_agent: String,
    pub headless: bool,
    /// Concurrent body-text fetches in the matcher.
    pub body_concurrency: usize,
    pub enrichment_concurrency: usize,
    pub enrichment: Option<EnrichmentConfig>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            nfl: NflSource::default(),
            espn: EspnSource::default(),
            timeouts: Timeouts::default(),
            user_agent: "Mozilla/5.0".to_string(),
            headless: true,
            body_concurrency: 4,
            enrichment_concurrency: 4,
            enrichment: None,
        }
    }
}

/// DOM conventions of the NFL.com analysis listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NflSource {
    pub listing_url: String,
    pub title_selector: String,
    pub link_tag: String,
    pub published_tag: String,
    pub published_marker: String,
}

impl Default for NflSource {
    fn default() -> Self {
        Self {
            listing_url: "https://www.nfl.com/news/series/analysis-news".to_string(),
            title_selector: "h3.d3-o-media-object__title".to_string(),
            link_tag: "a".to_string(),
            published_tag: "span".to_string(),
            published_marker: "Published:".to_string(),
        }
    }
}

/// DOM conventions of the ESPN latest-news listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EspnSource {
    pub listing_url: String,
    pub heading_tag: String,
    pub category_label: String,
    pub list_tag: String,
    pub item_tag: String,
    pub link_tag: String,
}

impl Default for EspnSource {
    fn default() -> Self {
        Self {
            listing_url: "https://www.espn.com/espn/latestnews".to_string(),
            heading_tag: "h3".to_string(),
            category_label: "NFL".to_string(),
            list_tag: "ul".to_string(),
            item_tag: "li".to_string(),
            link_tag: "a".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    pub listing_wait_ms: u64,
    pub scroll_wait_ms: u64,
    pub render_settle_ms: u64,
    pub static_fetch_ms: u64,
    pub browser_idle_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            listing_wait_ms: 5_000,
            scroll_wait_ms: 3_000,
            render_settle_ms: 1_000,
            static_fetch_ms: 5_000,
            browser_idle_secs: 600,
        }
    }
}

impl Timeouts {
    pub fn listing_wait(&self) -> Duration {
        Duration::from_millis(self.listing_wait_ms)
    }

    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn static_fetch(&self) -> Duration {
        Duration::from_millis(self.static_fetch_ms)
    }

    pub fn browser_idle(&self) -> Duration {
        Duration::from_secs(self.browser_idle_secs)
    }
}

/// OpenAI-compatible endpoint used for article summaries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub endpoint: String,
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> usize {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

/// Load a YAML config file. Missing keys fall back to defaults.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<ScraperConfig> {
    let raw = std::fs::read_to_string(path)?;
    let config: ScraperConfig = serde_yaml::from_str(&raw)?;
    info!(
        nfl = %config.nfl.listing_url,
        espn = %config.espn.listing_url,
        enrichment = config.enrichment.is_some(),
        "Loaded configuration"
    );
    Ok(config)
}
