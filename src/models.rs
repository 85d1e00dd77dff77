//! Data models shared by the extractors, the matcher, and the output layer.
//!
//! - [`Athlete`]: caller-supplied roster entry
//! - [`CandidateArticle`]: an article discovered on a listing page
//! - [`MatchRecord`]: one (article, athlete) pairing returned to the caller
//! - [`EnrichedRecord`]: a match record with the optional summary/sentiment
//!
//! Output records serialize with the camelCase field names the mobile front
//! end reads. Absent values are written as `""`, never `null`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// A roster entry supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Athlete {
    /// The athlete's display name, matched against article titles.
    pub name: String,
    /// Team abbreviation or name, copied into every match record.
    pub team: String,
}

/// An article discovered on a source listing page, before athlete matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArticle {
    /// Absolute article URL; unique within one extractor's output.
    pub url: String,
    /// Headline text as shown on the listing page.
    pub title: String,
    /// Publish date, when one could be resolved.
    pub published: Option<NaiveDate>,
}

/// One (article, athlete) pairing with denormalized article metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub team_name: String,
    pub player_name: String,
    pub article_title: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub source_host: String,
    /// `YYYY-MM-DD` when the publish date is known.
    #[serde(with = "empty_string", default)]
    pub date: Option<String>,
    #[serde(with = "empty_string", default)]
    pub body_text: Option<String>,
}

/// A [`MatchRecord`] with the output of the downstream enrichment step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: MatchRecord,
    #[serde(default)]
    pub summary: String,
    /// Opaque label produced by the enrichment model.
    #[serde(default)]
    pub sentiment: String,
}

impl From<MatchRecord> for EnrichedRecord {
    fn from(record: MatchRecord) -> Self {
        Self {
            record,
            summary: String::new(),
            sentiment: String::new(),
        }
    }
}

/// Response envelope written to stdout or to the JSON output directory.
#[derive(Debug, Deserialize, Serialize)]
pub struct ArticlesResponse<T> {
    pub articles: Vec<T>,
}

/// Network location of `url` without a leading `www.`.
///
/// Returns an empty string for URLs that do not parse or have no host.
///
/// ```ignore
/// assert_eq!(source_host("https://www.espn.com/nfl/story/x"), "espn.com");
/// ```
pub fn source_host(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Format a resolved publish date the way output records carry it.
pub fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Serde adapter mapping `None` to `""` and back.
mod empty_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
