//! NFL.com analysis listing.
//!
//! The listing renders headlines as `h3.d3-o-media-object__title` inside the
//! card's `<a>`; more cards load on scroll. The listing shows no dates, so
//! each article page is checked for its `Published: ...` byline, first with a
//! static fetch and then, if that comes up empty, in the browser.

use super::{dedupe_by_url, resolve_href};
use crate::config::{NflSource, Timeouts};
use crate::dates::parse_date;
use crate::error::Result;
use crate::fetch::{StaticFetch, find_marked_text};
use crate::models::CandidateArticle;
use crate::render::dom::{ancestor, visible_text};
use crate::render::{Dom, Locator, PageRenderer};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

/// Where a publish date can be read from, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTier {
    /// Unrendered GET of the article page.
    Static,
    /// The article page loaded in the shared browser tab.
    Rendered,
}

pub const DATE_TIERS: &[DateTier] = &[DateTier::Static, DateTier::Rendered];

/// Collect headlines, URLs, and publish dates from the NFL.com listing.
///
/// # Errors
///
/// Browser failures on the listing page itself are returned:
/// [`NewsError::Navigation`](crate::error::NewsError::Navigation) when it
/// does not load, `Session` when the browser is gone. Missing headlines
/// yield an empty list; missing dates yield `None`.
#[instrument(level = "info", skip_all, fields(listing = %source.listing_url))]
pub async fn collect_articles<R, F>(
    renderer: &mut R,
    fetcher: &F,
    source: &NflSource,
    timeouts: &Timeouts,
) -> Result<Vec<CandidateArticle>>
where
    R: PageRenderer,
    F: StaticFetch,
{
    let headline = Locator::Css(source.title_selector.clone());

    renderer.render(&source.listing_url).await?;
    if !renderer.wait_for(&headline, timeouts.listing_wait()).await {
        warn!(selector = %source.title_selector, "No NFL headlines before timeout");
    }

    // More cards load on scroll; none appearing is fine.
    renderer.scroll_to_bottom().await?;
    renderer.wait_for(&headline, timeouts.scroll_wait()).await;

    let html = renderer.content().await?;
    let mut articles = dedupe_by_url(parse_listing(&html, source)?);
    info!(count = articles.len(), "Found NFL headlines");

    for article in &mut articles {
        article.published = resolve_published(renderer, fetcher, &article.url, source, timeouts).await;
        info!(
            title = %article.title,
            url = %article.url,
            date = ?article.published,
            "Collected NFL article"
        );
    }
    Ok(articles)
}

/// Headline/URL pairs in listing order. Headlines without an enclosing link
/// are skipped.
pub fn parse_listing(html: &str, source: &NflSource) -> Result<Vec<CandidateArticle>> {
    let dom = Dom::parse(html);
    let mut out = Vec::new();
    for heading in dom.select_all(&source.title_selector)? {
        let title = visible_text(heading);
        let Some(link) = ancestor(heading, &source.link_tag) else {
            warn!(%title, "Headline has no enclosing link; skipping");
            continue;
        };
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_href(&source.listing_url, href))
        else {
            warn!(%title, "Headline link has no href; skipping");
            continue;
        };
        out.push(CandidateArticle {
            url,
            title,
            published: None,
        });
    }
    Ok(out)
}

/// Try each [`DateTier`] in order until one yields a parseable date.
#[instrument(level = "debug", skip(renderer, fetcher, source, timeouts))]
pub async fn resolve_published<R, F>(
    renderer: &mut R,
    fetcher: &F,
    url: &str,
    source: &NflSource,
    timeouts: &Timeouts,
) -> Option<NaiveDate>
where
    R: PageRenderer,
    F: StaticFetch,
{
    for &tier in DATE_TIERS {
        let Some(text) = published_text(tier, renderer, fetcher, url, source, timeouts).await else {
            debug!(?tier, %url, "No published marker");
            continue;
        };
        match parse_date(&text) {
            Some(date) => return Some(date),
            None => warn!(?tier, %url, %text, "Published marker did not parse as a date"),
        }
    }
    None
}

async fn published_text<R, F>(
    tier: DateTier,
    renderer: &mut R,
    fetcher: &F,
    url: &str,
    source: &NflSource,
    timeouts: &Timeouts,
) -> Option<String>
where
    R: PageRenderer,
    F: StaticFetch,
{
    let html = match tier {
        DateTier::Static => fetcher.fetch_static_html(url).await?,
        DateTier::Rendered => {
            if let Err(e) = renderer.render(url).await {
                warn!(%url, error = %e, "Rendering article page failed");
                return None;
            }
            let marker = Locator::TextPrefix {
                tag: source.published_tag.clone(),
                prefix: source.published_marker.clone(),
            };
            renderer.wait_for(&marker, timeouts.render_settle()).await;
            match renderer.content().await {
                Ok(html) => html,
                Err(e) => {
                    warn!(%url, error = %e, "Reading rendered article failed");
                    return None;
                }
            }
        }
    };
    find_marked_text(&html, &source.published_tag, &source.published_marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureFetcher, FixtureRenderer};

    const LISTING: &str = "https://www.nfl.com/news/series/analysis-news";

    fn listing_html() -> String {
        r#"
        <html><body>
          <ul>
            <li><a href="/news/josh-allen-leads-bills"><div class="d3-o-media-object">
              <h3 class="d3-o-media-object__title">Josh Allen leads Bills</h3></div></a></li>
            <li><a href="https://www.nfl.com/news/saquon-barkley-week-5">
              <h3 class="d3-o-media-object__title">Saquon Barkley week 5</h3></a></li>
            <li><div><h3 class="d3-o-media-object__title">Sponsored heading</h3></div></li>
            <li><a href="/news/mystery-date">
              <h3 class="d3-o-media-object__title">Mystery date</h3></a></li>
            <li><a href="/news/josh-allen-leads-bills">
              <h3 class="d3-o-media-object__title">Josh Allen leads Bills (updated)</h3></a></li>
          </ul>
        </body></html>
        "#
        .to_string()
    }

    fn byline(date: &str) -> String {
        format!(
            r#"<html><body><div><span>By NFL.com</span><span>Published: {date}</span></div><p>Body</p></body></html>"#
        )
    }

    #[test]
    fn test_parse_listing_resolves_links_and_skips_orphans() {
        let entries = parse_listing(&listing_html(), &NflSource::default()).unwrap();
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.nfl.com/news/josh-allen-leads-bills",
                "https://www.nfl.com/news/saquon-barkley-week-5",
                "https://www.nfl.com/news/mystery-date",
                "https://www.nfl.com/news/josh-allen-leads-bills",
            ]
        );
        assert_eq!(entries[0].title, "Josh Allen leads Bills");
    }

    #[tokio::test]
    async fn test_collect_uses_static_then_rendered_dates() {
        let allen = "https://www.nfl.com/news/josh-allen-leads-bills";
        let barkley = "https://www.nfl.com/news/saquon-barkley-week-5";
        let mystery = "https://www.nfl.com/news/mystery-date";

        let mut renderer = FixtureRenderer::new()
            .page(LISTING, &listing_html())
            .page(barkley, &byline("Oct 02, 2025 at 04:30 PM"));
        let fetcher = FixtureFetcher::new()
            .page(allen, &byline("Oct 01, 2025 at 09:15 AM"))
            .page(mystery, "<html><body><p>No byline</p></body></html>");

        let articles = collect_articles(
            &mut renderer,
            &fetcher,
            &NflSource::default(),
            &Timeouts::default(),
        )
        .await
        .unwrap();

        assert_eq!(articles.len(), 3);

        // Duplicate URL keeps its slot with the last title seen.
        assert_eq!(articles[0].url, allen);
        assert_eq!(articles[0].title, "Josh Allen leads Bills (updated)");
        assert_eq!(articles[0].published, NaiveDate::from_ymd_opt(2025, 10, 1));

        assert_eq!(articles[1].published, NaiveDate::from_ymd_opt(2025, 10, 2));
        assert_eq!(articles[2].published, None);

        // Static hit never touches the browser; misses fall back to it.
        assert_eq!(renderer.rendered, vec![LISTING, barkley, mystery]);
        assert_eq!(renderer.scrolls, 1);
        assert_eq!(fetcher.calls_for(allen), 1);
    }

    #[tokio::test]
    async fn test_unparseable_static_date_falls_back() {
        let allen = "https://www.nfl.com/news/josh-allen-leads-bills";
        let source = NflSource::default();

        let mut renderer = FixtureRenderer::new().page(allen, &byline("October 1, 2025"));
        let fetcher = FixtureFetcher::new().page(allen, &byline("sometime last week"));

        let date = resolve_published(&mut renderer, &fetcher, allen, &source, &Timeouts::default()).await;
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 10, 1));
    }

    #[tokio::test]
    async fn test_fallback_render_failure_leaves_date_absent() {
        let allen = "https://www.nfl.com/news/josh-allen-leads-bills";
        let mut renderer = FixtureRenderer::new()
            .page(LISTING, &listing_html())
            .failing(allen);
        let fetcher = FixtureFetcher::new();

        let articles = collect_articles(
            &mut renderer,
            &fetcher,
            &NflSource::default(),
            &Timeouts::default(),
        )
        .await
        .unwrap();

        assert_eq!(articles.len(), 3);
        assert!(articles.iter().all(|a| a.published.is_none()));
    }

    #[tokio::test]
    async fn test_empty_listing_yields_no_articles() {
        let mut renderer = FixtureRenderer::new().page(LISTING, "<html><body><p>Maintenance</p></body></html>");
        let fetcher = FixtureFetcher::new();

        let articles = collect_articles(
            &mut renderer,
            &fetcher,
            &NflSource::default(),
            &Timeouts::default(),
        )
        .await
        .unwrap();

        assert!(articles.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_listing_session_failure_propagates() {
        let mut renderer = FixtureRenderer::new().failing(LISTING);
        let fetcher = FixtureFetcher::new();

        let err = collect_articles(
            &mut renderer,
            &fetcher,
            &NflSource::default(),
            &Timeouts::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_not_fatal() {
        let mut renderer = FixtureRenderer::new().unreachable(LISTING);
        let fetcher = FixtureFetcher::new();

        let err = collect_articles(
            &mut renderer,
            &fetcher,
            &NflSource::default(),
            &Timeouts::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, crate::error::NewsError::Navigation(_)));
        assert!(!err.is_fatal());
        assert!(fetcher.calls().is_empty());
    }
}
