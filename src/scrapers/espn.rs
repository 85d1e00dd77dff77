//! ESPN latest-news listing.
//!
//! The page groups headlines under sport headings:
//!
//! ```html
//! <h3>NFL</h3>
//! <ul>
//!   <li><a href="...">Headline</a> (Oct 3, 5:12 PM ET)</li>
//! </ul>
//! ```
//!
//! Dates are whatever text of the `<li>` is left once the headline is
//! removed.

use super::{dedupe_by_url, resolve_href};
use crate::config::{EspnSource, Timeouts};
use crate::dates::{parse_date, strip_timezone};
use crate::error::{NewsError, Result};
use crate::models::CandidateArticle;
use crate::render::dom::{children, descendant, following_sibling, visible_text};
use crate::render::{Dom, Locator, PageRenderer};
use tracing::{debug, error, info, instrument, warn};

/// Collect headlines listed under the configured category heading.
///
/// A missing heading or list is logged and yields no articles. Only a
/// listing that fails to load or a dead session is returned as an error.
#[instrument(level = "info", skip_all, fields(listing = %source.listing_url))]
pub async fn collect_articles<R: PageRenderer>(
    renderer: &mut R,
    source: &EspnSource,
    timeouts: &Timeouts,
) -> Result<Vec<CandidateArticle>> {
    let heading = Locator::TagText {
        tag: source.heading_tag.clone(),
        text: source.category_label.clone(),
    };

    renderer.render(&source.listing_url).await?;
    if !renderer.wait_for(&heading, timeouts.listing_wait()).await {
        warn!(label = %source.category_label, "Category heading did not appear before timeout");
    }
    let html = renderer.content().await?;

    match parse_listing(&html, source) {
        Ok(articles) => {
            info!(count = articles.len(), "Collected ESPN articles");
            Ok(articles)
        }
        Err(e) => {
            error!(error = %e, "Error collecting ESPN articles");
            Ok(Vec::new())
        }
    }
}

/// Articles listed under the category heading, in page order.
///
/// # Errors
///
/// [`NewsError::Structure`] when the heading or its list is missing,
/// [`NewsError::Selector`] when a configured tag is not a valid selector.
pub fn parse_listing(html: &str, source: &EspnSource) -> Result<Vec<CandidateArticle>> {
    let dom = Dom::parse(html);
    let heading = dom
        .find_by_tag_text(&source.heading_tag, &source.category_label)?
        .ok_or_else(|| {
            NewsError::Structure(format!(
                "no <{}> heading with text `{}`",
                source.heading_tag, source.category_label
            ))
        })?;
    let list = following_sibling(heading, &source.list_tag).ok_or_else(|| {
        NewsError::Structure(format!(
            "no <{}> after the `{}` heading",
            source.list_tag, source.category_label
        ))
    })?;

    let mut out = Vec::new();
    for item in children(list, &source.item_tag) {
        let Some(link) = descendant(item, &source.link_tag) else {
            debug!("List item without a link; skipping");
            continue;
        };
        let title = visible_text(link);
        let url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_href(&source.listing_url, href));
        let Some(url) = url.filter(|_| !title.is_empty()) else {
            debug!(%title, "List item missing href or title; skipping");
            continue;
        };

        let date_text = date_text(&visible_text(item), &title);
        let published = parse_date(&date_text);
        if published.is_none() {
            debug!(%url, %date_text, "No date for ESPN item");
        }
        out.push(CandidateArticle {
            url,
            title,
            published,
        });
    }
    Ok(dedupe_by_url(out))
}

/// The part of an item's text that is not the headline, without the
/// surrounding parentheses or a trailing time zone.
fn date_text(item_text: &str, title: &str) -> String {
    let remainder = item_text.replace(title, "");
    strip_timezone(&remainder).to_string()
}
