//! Athlete-to-article matching.
//!
//! A title matches an athlete when the athlete's full name appears in it as
//! a case-insensitive whole-word sequence: "Allen" matches
//! "Josh Allen Injury Update" but not "Allentown Reports". Body text is
//! fetched once per matched article and shared by all of its records.

use crate::fetch::{StaticFetch, fetch_body_text};
use crate::models::{Athlete, CandidateArticle, MatchRecord, format_date, source_host};
use futures::stream::{self, StreamExt};
use regex::{Regex, RegexBuilder};
use tracing::{debug, info, instrument, warn};

/// Whole-word, case-insensitive pattern for `name`.
///
/// A name edge that is punctuation ("Jr.") is anchored with `\B`, so the
/// neighbouring character must not be part of a word either.
///
/// # Arguments
///
/// * `name` - The athlete's name as given in the roster; surrounding
///   whitespace is ignored.
///
/// # Errors
///
/// Returns a [`regex::Error`] if the escaped name still fails to compile
/// (e.g. it exceeds the regex size limit).
pub fn name_pattern(name: &str) -> Result<Regex, regex::Error> {
    let name = name.trim();
    let edge = |c: Option<char>| match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => r"\B",
    };
    let pattern = format!(
        "{}{}{}",
        edge(name.chars().next()),
        regex::escape(name),
        edge(name.chars().last())
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Matches articles to athletes and builds [`MatchRecord`]s.
pub struct Matcher<'a, F> {
    fetcher: &'a F,
    /// Body fetches in flight at once. Output order does not depend on it.
    concurrency: usize,
}

impl<'a, F: StaticFetch> Matcher<'a, F> {
    pub fn new(fetcher: &'a F, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// One record per (article, matched athlete), in article order and then
    /// athlete order.
    ///
    /// Athletes with blank names and articles with blank titles are ignored.
    /// Articles that match nobody are never fetched. Each matched article's
    /// body is fetched once and copied into all of its records.
    ///
    /// # Arguments
    ///
    /// * `athletes` - Roster entries; their order sets record order within
    ///   an article
    /// * `articles` - Candidates from all sources, NFL.com first
    ///
    /// # Returns
    ///
    /// The match records. Fetch failures show up as `body_text: None`,
    /// never as an error.
    #[instrument(level = "info", skip_all, fields(athletes = athletes.len(), articles = articles.len()))]
    pub async fn match_articles(
        &self,
        athletes: &[Athlete],
        articles: &[CandidateArticle],
    ) -> Vec<MatchRecord> {
        let patterns: Vec<(&Athlete, Regex)> = athletes
            .iter()
            .filter_map(|athlete| {
                if athlete.name.trim().is_empty() {
                    warn!(team = %athlete.team, "Athlete without a name; skipping");
                    return None;
                }
                match name_pattern(&athlete.name) {
                    Ok(pattern) => Some((athlete, pattern)),
                    Err(e) => {
                        warn!(name = %athlete.name, error = %e, "Could not build name pattern");
                        None
                    }
                }
            })
            .collect();

        let hits: Vec<(&CandidateArticle, Vec<&Athlete>)> = articles
            .iter()
            .filter(|article| !article.title.trim().is_empty())
            .filter_map(|article| {
                let matched: Vec<&Athlete> = patterns
                    .iter()
                    .filter(|(_, pattern)| pattern.is_match(&article.title))
                    .map(|(athlete, _)| *athlete)
                    .collect();
                if matched.is_empty() {
                    None
                } else {
                    debug!(title = %article.title, matches = matched.len(), "Title matched");
                    Some((article, matched))
                }
            })
            .collect();
        info!(matched_articles = hits.len(), "Matched titles");

        let fetcher = self.fetcher;
        let with_bodies: Vec<_> = stream::iter(hits)
            .map(|(article, matched)| async move {
                let body = fetch_body_text(fetcher, &article.url).await;
                (article, matched, body)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        for (article, matched, body) in with_bodies {
            let date = format_date(article.published);
            let host = source_host(&article.url);
            records.extend(matched.into_iter().map(|athlete| MatchRecord {
                team_name: athlete.team.clone(),
                player_name: athlete.name.clone(),
                article_title: article.title.clone(),
                source_url: article.url.clone(),
                source_host: host.clone(),
                date: date.clone(),
                body_text: body.clone(),
            }));
        }
        info!(records = records.len(), "Built match records");
        records
    }
}
