//! Article enrichment through an OpenAI-compatible chat API.
//!
//! Each matched article's body text is sent to the model, which answers with
//! a short summary and an availability label for the player. The label is
//! passed through as-is.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for one prompt/response exchange
//! - [`ChatClient`]: `POST {endpoint}/chat/completions` over `reqwest`
//! - [`RetryAsk`]: decorator adding exponential backoff to any `AskAsync`
//!
//! # Retry Strategy
//!
//! - Configurable maximum attempts (5 by default)
//! - Exponential backoff from a base delay, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::config::EnrichmentConfig;
use crate::models::{EnrichedRecord, MatchRecord};
use crate::utils::{looks_truncated, truncate_for_log};
use futures::stream::{self, StreamExt};
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You summarize NFL news for fantasy football players. \
Reply with only a JSON object of the form \
{\"summary\": \"<two sentences>\", \"sentiment\": \"available\" | \"questionable\" | \"out\"} \
where sentiment is the player's likely availability for the next game.";

/// Trait for async LLM interaction.
pub trait AskAsync {
    type Response;

    /// Send `text` to the model and return its reply.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Adds exponential backoff retries to any [`AskAsync`] implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let shift = (attempt - 1).min(16) as u32;
                    let delay = self
                        .base_delay
                        .saturating_mul(1u32 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Chat-completions client for one model.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl AskAsync for ChatClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": text},
            ],
        });

        let mut req = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                status = status.as_u16(),
                "API call failed"
            );
            return Err(format!("chat API returned {}: {}", status, truncate_for_log(&message, 200)).into());
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "chat API returned no content".into())
    }
}

/// Model output for one article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrichment {
    pub summary: String,
    pub sentiment: String,
}

/// Parse the model reply, tolerating a surrounding Markdown code fence.
pub fn parse_enrichment(reply: &str) -> Result<Enrichment, serde_json::Error> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim())
}

/// Ask for an enrichment of `body_text`, re-asking once if the reply was
/// cut off mid-JSON.
///
/// # Errors
///
/// Returns an error if the request fails after the client's own retries,
/// or if the reply (or the second reply after truncation) is not the
/// expected `{summary, sentiment}` JSON.
#[instrument(level = "info", skip_all)]
pub async fn enrich_body<A>(api: &A, body_text: &str) -> Result<Enrichment, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
{
    let reply = api.ask(body_text).await?;
    match parse_enrichment(&reply) {
        Ok(enrichment) => Ok(enrichment),
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, "EOF while parsing; re-asking once");
            let retry = api.ask(body_text).await?;
            Ok(parse_enrichment(&retry)?)
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Model returned non-conforming JSON"
            );
            Err(e.into())
        }
    }
}

/// Build the retrying client described by `config`.
pub fn client_from_config(config: &EnrichmentConfig, api_key: Option<String>) -> RetryAsk<ChatClient> {
    RetryAsk::new(
        ChatClient::new(&config.endpoint, &config.model, api_key),
        config.max_retries,
        StdDuration::from_millis(config.base_delay_ms),
    )
}

/// Enrich every record that has body text, keeping input order.
///
/// Up to `concurrency` requests are in flight at once; results are
/// collected with `buffered`, so the output lines up with `records`.
///
/// # Arguments
///
/// * `api` - Chat client, usually a [`RetryAsk<ChatClient>`]
/// * `records` - Match records from the pipeline
/// * `concurrency` - Maximum simultaneous requests (at least 1 is used)
///
/// # Returns
///
/// One [`EnrichedRecord`] per input record. Records without body text are
/// not sent; they and any failed request keep `summary` and `sentiment`
/// empty. This never fails the run.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub async fn enrich_records<A>(
    api: &A,
    records: Vec<MatchRecord>,
    concurrency: usize,
) -> Vec<EnrichedRecord>
where
    A: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let enriched: Vec<EnrichedRecord> = stream::iter(records)
        .map(|record| async move {
            let Some(body) = record.body_text.clone() else {
                return EnrichedRecord::from(record);
            };
            match enrich_body(api, &body).await {
                Ok(Enrichment { summary, sentiment }) => EnrichedRecord {
                    record,
                    summary,
                    sentiment,
                },
                Err(e) => {
                    error!(url = %record.source_url, error = %e, "Enrichment failed; leaving fields empty");
                    EnrichedRecord::from(record)
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let summarized = enriched.iter().filter(|r| !r.summary.is_empty()).count();
    info!(
        summarized,
        elapsed_ms_total = t0.elapsed().as_millis() as u64,
        "Enrichment complete"
    );
    enriched
}
