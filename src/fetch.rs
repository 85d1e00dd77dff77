//! Static (unrendered) page fetches.
//!
//! Article pages on both sources ship their body and byline in the initial
//! HTML, so a plain GET is tried before anything touches the browser. Every
//! failure here (network error, timeout, non-200) is reported as `None`.

use crate::error::Result;
use crate::render::dom::{collapse_whitespace, parse_selector};
use reqwest::{Client, StatusCode};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A single-attempt HTTP GET that yields the page HTML or nothing.
pub trait StaticFetch {
    async fn fetch_static_html(&self, url: &str) -> Option<String>;
}

/// [`StaticFetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl StaticFetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_static_html(&self, url: &str) -> Option<String> {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, error = %e, "Static fetch failed");
                return None;
            }
        };
        if resp.status() != StatusCode::OK {
            debug!(%url, status = resp.status().as_u16(), "Static fetch returned non-200");
            return None;
        }
        match resp.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%url, error = %e, "Reading static response body failed");
                None
            }
        }
    }
}

/// Text of every `<p>`, trimmed, empties skipped, joined with single spaces.
pub fn extract_body_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = parse_selector("p").ok()?;
    let paragraphs = document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join(" "))
    }
}

/// First `tag` element whose text starts with `marker`, returning what
/// follows the marker.
pub fn find_marked_text(html: &str, tag: &str, marker: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = parse_selector(tag).ok()?;
    document
        .select(&selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find_map(|text| {
            text.strip_prefix(marker)
                .map(|rest| rest.trim().to_string())
        })
        .filter(|rest| !rest.is_empty())
}

/// Fetch `url` statically and pull its paragraph text.
///
/// One attempt, no retry. Used by the matcher for every matched article.
///
/// # Arguments
///
/// * `fetcher` - Static HTTP client (or a fixture in tests)
/// * `url` - Article page to read
///
/// # Returns
///
/// The trimmed, non-empty `<p>` texts joined with single spaces, or `None`
/// when the fetch failed, the status was not 200, or no paragraph had text.
#[instrument(level = "debug", skip(fetcher))]
pub async fn fetch_body_text<F: StaticFetch>(fetcher: &F, url: &str) -> Option<String> {
    let html = fetcher.fetch_static_html(url).await?;
    let body = extract_body_text(&html);
    if body.is_none() {
        debug!(%url, "Article page has no paragraph text");
    }
    body
}
