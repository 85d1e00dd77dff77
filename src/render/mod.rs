//! Rendered page access.
//!
//! Both listing pages fill in their article lists with JavaScript, so the
//! extractors talk to a [`PageRenderer`]: a single browser tab that can load
//! a URL, wait for an element, scroll, and hand back the rendered HTML. The
//! HTML is then queried through a [`Dom`] snapshot, which supports the
//! structural lookups the sources need (ancestor, following sibling, direct
//! children).
//!
//! The production implementation is [`chrome::ChromeSession`], created by
//! [`ChromeLauncher`]. Tests use fixture renderers that serve fixed HTML.

pub mod chrome;
pub mod dom;

use crate::error::Result;
use std::time::Duration;

pub use chrome::ChromeLauncher;
pub use dom::Dom;

/// How to find an element when waiting on a live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A CSS selector; satisfied when at least one element matches.
    Css(String),
    /// An element `tag` whose text equals `text` exactly.
    TagText { tag: String, text: String },
    /// An element `tag` whose text starts with `prefix`.
    TextPrefix { tag: String, prefix: String },
}

impl Locator {
    /// XPath equivalent for the text-based locators.
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Locator::Css(_) => None,
            Locator::TagText { tag, text } => {
                Some(format!("//{}[text()={}]", tag, xpath_literal(text)))
            }
            Locator::TextPrefix { tag, prefix } => Some(format!(
                "//{}[starts-with(text(),{})]",
                tag,
                xpath_literal(prefix)
            )),
        }
    }
}

fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts = s.split('\'').map(|p| format!("'{p}'")).collect::<Vec<_>>();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// One browser tab.
///
/// Calls are sequential: the session models a single tab and must not be
/// driven from several tasks at once.
pub trait PageRenderer {
    /// Navigate to `url` and wait for the load to finish.
    async fn render(&mut self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for `locator` to match. Returns whether it did.
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> bool;

    /// Scroll to the bottom of the page to trigger lazy loading.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// The current rendered HTML.
    async fn content(&mut self) -> Result<String>;

    /// Release the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Creates one [`PageRenderer`] session per pipeline run.
pub trait SessionLauncher {
    type Session: PageRenderer;

    async fn launch(&self) -> Result<Self::Session>;
}
