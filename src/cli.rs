//! Command-line interface definitions.
//!
//! Secrets can come from the environment instead of flags.

use clap::Parser;

/// Find today's NFL.com and ESPN articles about the athletes on a roster.
///
/// # Examples
///
/// ```sh
/// # Print matches as JSON
/// roster_news -a roster.json
///
/// # Read the roster from stdin and write dated JSON files
/// cat roster.json | roster_news -a - -j ./json
///
/// # Summarize matched articles with a local model
/// roster_news -a roster.json -c config.yaml --enrich
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file with `[{"name": ..., "team": ...}]`, or `-` for stdin
    #[arg(short, long)]
    pub athletes: String,

    /// Output directory for dated JSON files (prints to stdout when omitted)
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Summarize matched articles with the configured chat model
    #[arg(long)]
    pub enrich: bool,

    /// API key for the enrichment endpoint
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,
}
