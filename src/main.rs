//! # Roster News
//!
//! Collects the latest NFL articles from NFL.com and ESPN, matches their
//! headlines against a roster of athletes, and emits one JSON record per
//! (article, athlete) pair with the article's date and body text.
//!
//! ## Usage
//!
//! ```sh
//! roster_news -a roster.json -j ./json
//! ```
//!
//! ## Architecture
//!
//! 1. **Collection**: render each listing page in headless Chrome and read
//!    headlines, links, and dates (NFL.com, then ESPN)
//! 2. **Matching**: whole-word name matching on titles; body text is fetched
//!    only for matched articles
//! 3. **Enrichment** (optional): summary and availability label per record
//! 4. **Output**: `{"articles": [...]}` to stdout or a dated JSON file

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dates;
mod error;
mod fetch;
mod matcher;
mod models;
mod outputs;
mod pipeline;
mod render;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::{ScraperConfig, load_config};
use fetch::HttpFetcher;
use models::{Athlete, EnrichedRecord, MatchRecord};
use outputs::json;
use pipeline::Pipeline;
use render::ChromeLauncher;
use utils::{ensure_writable_dir, time_of_day};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("roster_news starting up");

    let args = Cli::parse();
    debug!(?args.athletes, ?args.json_output_dir, ?args.config, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => load_config(Path::new(path))?,
        None => ScraperConfig::default(),
    };
    if args.headful {
        config.headless = false;
    }

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let athletes = read_athletes(&args.athletes).await?;
    info!(count = athletes.len(), "Loaded athletes");

    // ---- Collect and match ----
    let launcher = ChromeLauncher {
        headless: config.headless,
        idle_timeout: config.timeouts.browser_idle(),
    };
    let fetcher = HttpFetcher::new(&config.user_agent, config.timeouts.static_fetch())?;
    let pipeline = Pipeline::new(launcher, fetcher, config.clone());

    let records = match pipeline.run(&athletes).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            return Err(e.into());
        }
    };

    for (host, count) in records
        .iter()
        .counts_by(|r| r.source_host.clone())
        .into_iter()
        .sorted()
    {
        info!(%host, count, "Records by source");
    }

    // ---- Optional enrichment ----
    let enriched = enrich(&args, &config, records).await;

    // ---- Output ----
    match &args.json_output_dir {
        Some(dir) => {
            let local_date = Local::now().date_naive().to_string();
            json::write_articles(enriched, dir, &local_date, time_of_day()).await?;
        }
        None => println!("{}", json::to_json(enriched)?),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Read the roster from a file, or stdin when `source` is `-`.
#[instrument(level = "info")]
async fn read_athletes(source: &str) -> Result<Vec<Athlete>, Box<dyn Error>> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(source).await?
    };
    Ok(serde_json::from_str(&raw)?)
}

async fn enrich(args: &Cli, config: &ScraperConfig, records: Vec<MatchRecord>) -> Vec<EnrichedRecord> {
    if !args.enrich {
        return records.into_iter().map(EnrichedRecord::from).collect();
    }
    let Some(settings) = &config.enrichment else {
        warn!("--enrich given but no `enrichment` section in config; skipping");
        return records.into_iter().map(EnrichedRecord::from).collect();
    };

    let client = api::client_from_config(settings, args.llm_api_key.clone());
    info!(?client, endpoint = %settings.endpoint, model = %settings.model, "Enriching records");
    api::enrich_records(&client, records, config.enrichment_concurrency).await
}
