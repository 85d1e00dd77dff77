//! Pipeline orchestration.
//!
//! One run owns one browser session:
//! 1. **Launch**: start a [`PageRenderer`] session
//! 2. **Collect**: NFL.com, then ESPN, each isolated from the other's failures
//! 3. **Match**: title matching and body fetches for hits only
//! 4. **Release**: close the session whatever happened above, panics included

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::fetch::StaticFetch;
use crate::matcher::Matcher;
use crate::models::{Athlete, CandidateArticle, MatchRecord};
use crate::render::{PageRenderer, SessionLauncher};
use crate::scrapers::{espn, nfl};
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

pub struct Pipeline<L, F> {
    launcher: L,
    fetcher: F,
    config: ScraperConfig,
}

impl<L, F> Pipeline<L, F>
where
    L: SessionLauncher,
    F: StaticFetch,
{
    pub fn new(launcher: L, fetcher: F, config: ScraperConfig) -> Self {
        Self {
            launcher,
            fetcher,
            config,
        }
    }

    /// Collect articles from both sources and match them against `athletes`.
    ///
    /// Launches one browser session and scrapes NFL.com, then ESPN. A
    /// source that fails without killing the session (listing did not load,
    /// heading missing) contributes no articles and the run continues.
    ///
    /// # Arguments
    ///
    /// * `athletes` - The roster to match titles against
    ///
    /// # Returns
    ///
    /// Match records in article order (NFL.com, then ESPN) and, within an
    /// article, roster order.
    ///
    /// # Errors
    ///
    /// Only browser session failures abort the run. The session is closed
    /// exactly once before this returns, errors, or unwinds.
    #[instrument(level = "info", skip_all, fields(athletes = athletes.len()))]
    pub async fn run(&self, athletes: &[Athlete]) -> Result<Vec<MatchRecord>> {
        let t0 = Instant::now();
        let mut session = self.launcher.launch().await?;

        let outcome = AssertUnwindSafe(self.collect_and_match(&mut session, athletes))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Closing browser session failed");
        }

        match outcome {
            Ok(Ok(records)) => {
                info!(
                    records = records.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Pipeline finished"
                );
                Ok(records)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Pipeline aborted");
                Err(e)
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn collect_and_match(
        &self,
        session: &mut L::Session,
        athletes: &[Athlete],
    ) -> Result<Vec<MatchRecord>> {
        let config = &self.config;

        let nfl_articles = isolate(
            "nfl",
            nfl::collect_articles(session, &self.fetcher, &config.nfl, &config.timeouts).await,
        )?;
        let espn_articles = isolate(
            "espn",
            espn::collect_articles(session, &config.espn, &config.timeouts).await,
        )?;

        let mut articles = nfl_articles;
        articles.extend(espn_articles);
        info!(total = articles.len(), "Total collected articles");

        let matcher = Matcher::new(&self.fetcher, config.body_concurrency);
        Ok(matcher.match_articles(athletes, &articles).await)
    }
}

/// Turn a non-fatal source failure into an empty article list.
fn isolate(source: &str, result: Result<Vec<CandidateArticle>>) -> Result<Vec<CandidateArticle>> {
    match result {
        Ok(articles) => {
            info!(source, count = articles.len(), "Source collected");
            Ok(articles)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            error!(source, error = %e, "Source failed; continuing without it");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NewsError;
    use crate::testing::{FixtureFetcher, FixtureLauncher};

    const NFL: &str = "https://www.nfl.com/news/series/analysis-news";
    const ESPN: &str = "https://www.espn.com/espn/latestnews";
    const NFL_STORY: &str = "https://www.nfl.com/news/josh-allen-leads-bills";
    const ESPN_STORY: &str = "https://www.espn.com/nfl/story/_/id/1/allen-mahomes";

    fn nfl_listing() -> String {
        format!(
            r#"<html><body>
              <a href="{NFL_STORY}"><h3 class="d3-o-media-object__title">Josh Allen leads Bills</h3></a>
              <a href="https://www.nfl.com/news/other"><h3 class="d3-o-media-object__title">Week 5 power rankings</h3></a>
            </body></html>"#
        )
    }

    fn espn_listing() -> String {
        format!(
            r#"<html><body>
              <h3>NFL</h3>
              <ul><li><a href="{ESPN_STORY}">Allen and Mahomes set for rematch</a> (Oct 4, 2025, 7:00 PM ET)</li></ul>
            </body></html>"#
        )
    }

    fn article_page(date: &str, body: &str) -> String {
        format!("<html><body><span>Published: {date}</span><p>{body}</p></body></html>")
    }

    fn athletes() -> Vec<Athlete> {
        vec![
            Athlete {
                name: "Josh Allen".to_string(),
                team: "BUF".to_string(),
            },
            Athlete {
                name: "Mahomes".to_string(),
                team: "KC".to_string(),
            },
            Athlete {
                name: "Allen".to_string(),
                team: "BUF".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_run_merges_sources_in_order() {
        let launcher = FixtureLauncher::new()
            .page(NFL, &nfl_listing())
            .page(ESPN, &espn_listing());
        let fetcher = FixtureFetcher::new()
            .page(NFL_STORY, &article_page("Oct 01, 2025 at 09:15 AM", "Allen threw for 300 yards."))
            .page(ESPN_STORY, &article_page("ignored", "Rematch preview."));
        let pipeline = Pipeline::new(launcher, fetcher, ScraperConfig::default());

        let records = pipeline.run(&athletes()).await.unwrap();

        let pairs: Vec<_> = records
            .iter()
            .map(|r| (r.source_url.as_str(), r.player_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (NFL_STORY, "Josh Allen"),
                (NFL_STORY, "Allen"),
                (ESPN_STORY, "Mahomes"),
                (ESPN_STORY, "Allen"),
            ]
        );
        assert_eq!(records[0].date.as_deref(), Some("2025-10-01"));
        assert_eq!(records[0].source_host, "nfl.com");
        assert_eq!(records[2].date.as_deref(), Some("2025-10-04"));
        assert_eq!(records[2].body_text.as_deref(), Some("Rematch preview."));
        assert_eq!(pipeline.launcher.close_count(), 1);
    }

    #[tokio::test]
    async fn test_espn_structure_failure_keeps_nfl_results() {
        let launcher = FixtureLauncher::new()
            .page(NFL, &nfl_listing())
            .page(ESPN, "<html><body><h3>NBA</h3></body></html>");
        let fetcher = FixtureFetcher::new()
            .page(NFL_STORY, &article_page("Oct 01, 2025", "Allen threw for 300 yards."));
        let pipeline = Pipeline::new(launcher, fetcher, ScraperConfig::default());

        let records = pipeline.run(&athletes()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source_url == NFL_STORY));
        assert_eq!(pipeline.launcher.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_nfl_listing_keeps_espn_results() {
        let launcher = FixtureLauncher::new().unreachable(NFL).page(ESPN, &espn_listing());
        let fetcher = FixtureFetcher::new().page(ESPN_STORY, &article_page("ignored", "Rematch preview."));
        let pipeline = Pipeline::new(launcher, fetcher, ScraperConfig::default());

        let records = pipeline.run(&athletes()).await.unwrap();

        let players: Vec<_> = records.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(players, vec!["Mahomes", "Allen"]);
        assert!(records.iter().all(|r| r.source_url == ESPN_STORY));
        assert_eq!(pipeline.fetcher.calls_for(NFL_STORY), 0);
        assert_eq!(pipeline.launcher.close_count(), 1);
    }

    #[tokio::test]
    async fn test_huge_relative_date_is_absent_not_fatal() {
        let espn = format!(
            r#"<html><body><h3>NFL</h3>
              <ul><li><a href="{ESPN_STORY}">Josh Allen leads Bills</a> (99999999999999999 days ago)</li></ul>
            </body></html>"#
        );
        let launcher = FixtureLauncher::new()
            .page(NFL, "<html><body></body></html>")
            .page(ESPN, &espn);
        let fetcher = FixtureFetcher::new().page(ESPN_STORY, &article_page("ignored", "Allen threw for 300 yards."));
        let pipeline = Pipeline::new(launcher, fetcher, ScraperConfig::default());

        let records = pipeline.run(&athletes()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].player_name, "Josh Allen");
        assert_eq!(records[0].date, None);
        assert_eq!(pipeline.launcher.close_count(), 1);
    }

    #[tokio::test]
    async fn test_session_failure_aborts_and_closes() {
        let launcher = FixtureLauncher::new().page(NFL, &nfl_listing()).failing(ESPN);
        let pipeline = Pipeline::new(launcher, FixtureFetcher::new(), ScraperConfig::default());

        let err = pipeline.run(&athletes()).await.unwrap_err();

        assert!(matches!(err, NewsError::Session(_)));
        assert_eq!(pipeline.launcher.close_count(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let launcher = FixtureLauncher::new().unlaunchable();
        let pipeline = Pipeline::new(launcher, FixtureFetcher::new(), ScraperConfig::default());

        let err = pipeline.run(&athletes()).await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(pipeline.launcher.close_count(), 0);
    }

    #[tokio::test]
    async fn test_panic_during_body_fetch_still_closes_session() {
        let launcher = FixtureLauncher::new()
            .page(NFL, "<html><body></body></html>")
            .page(ESPN, &espn_listing());
        let fetcher = FixtureFetcher::new().panicking(ESPN_STORY);
        let pipeline = Pipeline::new(launcher, fetcher, ScraperConfig::default());

        let athletes = athletes();
        let outcome = AssertUnwindSafe(pipeline.run(&athletes)).catch_unwind().await;

        assert!(outcome.is_err());
        assert_eq!(pipeline.launcher.close_count(), 1);
    }
}
