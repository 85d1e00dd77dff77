//! Source extractors: one module per news site.
//!
//! Each extractor takes the shared [`PageRenderer`](crate::render::PageRenderer)
//! session, renders its listing page, and returns [`CandidateArticle`]s in
//! listing order with unique URLs.
//!
//! | Source | Module | Listing | Dates |
//! |--------|--------|---------|-------|
//! | NFL.com | [`nfl`] | `h3` headlines wrapped in links, lazy loaded | "Published:" byline on each article page |
//! | ESPN | [`espn`] | `<li>` items under the `NFL` heading | printed next to each headline |
//!
//! Failures inside an extractor are recovered per item (skip it) or per
//! source (no articles). Only session failures propagate.

pub mod espn;
pub mod nfl;

use crate::models::CandidateArticle;
use std::collections::HashMap;
use url::Url;

/// Keep one article per URL. A repeated URL overwrites the earlier entry's
/// title and date but keeps its position.
pub fn dedupe_by_url(articles: Vec<CandidateArticle>) -> Vec<CandidateArticle> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CandidateArticle> = Vec::with_capacity(articles.len());
    for article in articles {
        match index.get(&article.url) {
            Some(&i) => out[i] = article,
            None => {
                index.insert(article.url.clone(), out.len());
                out.push(article);
            }
        }
    }
    out
}

/// Resolve an `href` the way the browser's `href` property would.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(|u| u.to_string()),
        Err(_) => Some(href.to_string()),
    }
}
