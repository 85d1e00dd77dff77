//! Fixture doubles for the renderer and the static fetcher.

use crate::error::{NewsError, Result};
use crate::fetch::StaticFetch;
use crate::render::{Dom, Locator, PageRenderer, SessionLauncher};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves fixed HTML per URL and records what was rendered.
#[derive(Default)]
pub struct FixtureRenderer {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    unreachable: HashSet<String>,
    current: String,
    pub rendered: Vec<String>,
    pub scrolls: usize,
    closes: Arc<AtomicUsize>,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Rendering `url` reports a session failure.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Rendering `url` reports a page that did not load.
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }
}

impl PageRenderer for FixtureRenderer {
    async fn render(&mut self, url: &str) -> Result<()> {
        self.rendered.push(url.to_string());
        if self.failing.contains(url) {
            return Err(NewsError::Session(format!("renderer crashed on {url}")));
        }
        if self.unreachable.contains(url) {
            return Err(NewsError::Navigation(format!("{url}: net::ERR_NAME_NOT_RESOLVED")));
        }
        self.current = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, _timeout: Duration) -> bool {
        Dom::parse(&self.current).contains(locator)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.scrolls += 1;
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`FixtureRenderer`] sessions sharing one close counter.
#[derive(Default)]
pub struct FixtureLauncher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    unreachable: HashSet<String>,
    fail_launch: bool,
    pub closes: Arc<AtomicUsize>,
}

impl FixtureLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn unlaunchable(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SessionLauncher for FixtureLauncher {
    type Session = FixtureRenderer;

    async fn launch(&self) -> Result<FixtureRenderer> {
        if self.fail_launch {
            return Err(NewsError::Session("chrome binary not found".to_string()));
        }
        Ok(FixtureRenderer {
            pages: self.pages.clone(),
            failing: self.failing.clone(),
            unreachable: self.unreachable.clone(),
            closes: Arc::clone(&self.closes),
            ..FixtureRenderer::default()
        })
    }
}

/// Serves fixed HTML for static fetches and counts requests per URL.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    panic_on: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Fetching `url` panics, standing in for a bug deep in a fetch.
    pub fn panicking(mut self, url: &str) -> Self {
        self.panic_on.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| *u == url).count()
    }
}

impl StaticFetch for FixtureFetcher {
    async fn fetch_static_html(&self, url: &str) -> Option<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.panic_on.contains(url) {
            panic!("fixture fetch exploded for {url}");
        }
        self.pages.get(url).cloned()
    }
}
