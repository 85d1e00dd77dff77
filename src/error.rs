//! Error taxonomy for the collection pipeline.
//!
//! Only [`NewsError::Session`] is fatal. Every other variant is recovered
//! close to where it happens: a failed fetch becomes an absent field, a
//! page that will not load or a structural mismatch skips an item or a
//! whole source.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    /// The browser session could not be created or stopped responding.
    #[error("browser session failure: {0}")]
    Session(String),

    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// A page did not load: DNS or connection failure, or the navigation
    /// timed out. The session is still usable.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// An expected element was not present in the page.
    #[error("page structure mismatch: {0}")]
    Structure(String),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl NewsError {
    /// Whether this failure must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NewsError::Session(_))
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;
