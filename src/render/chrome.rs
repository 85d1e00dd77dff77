//! Headless Chrome implementation of [`PageRenderer`].
//!
//! `headless_chrome` is a blocking API. Every tab call runs on tokio's
//! blocking pool so the runtime keeps serving static fetches meanwhile.

use super::{Locator, PageRenderer, SessionLauncher};
use crate::error::{NewsError, Result};
use headless_chrome::browser::tab::NavigationFailed;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, info, instrument, warn};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Launches a fresh Chrome process per pipeline run.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    pub headless: bool,
    /// How long Chrome may stay silent before the connection is dropped.
    pub idle_timeout: Duration,
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    #[instrument(level = "info", skip_all, fields(headless = self.headless))]
    async fn launch(&self) -> Result<ChromeSession> {
        let options = LaunchOptions {
            headless: self.headless,
            ignore_certificate_errors: true,
            idle_browser_timeout: self.idle_timeout,
            ..Default::default()
        };
        let browser = Browser::new(options).map_err(session_error)?;
        let tab = browser.new_tab().map_err(session_error)?;
        info!("Chrome session started");
        Ok(ChromeSession {
            browser: Some(browser),
            tab: Some(tab),
        })
    }
}

/// A running Chrome process with one tab.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    fn tab(&self) -> Result<Arc<Tab>> {
        self.tab
            .clone()
            .ok_or_else(|| NewsError::Session("session already closed".to_string()))
    }
}

impl PageRenderer for ChromeSession {
    /// Navigation errors and load timeouts come back as
    /// [`NewsError::Navigation`]; anything else means the tab is gone.
    #[instrument(level = "debug", skip(self))]
    async fn render(&mut self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        let target = url.to_string();
        let load_error = blocking(move || {
            match tab.navigate_to(&target).and_then(|t| t.wait_until_navigated()) {
                Ok(_) => Ok(None),
                Err(e) if e.is::<NavigationFailed>() || e.is::<Timeout>() => Ok(Some(e.to_string())),
                Err(e) => Err(e),
            }
        })
        .await?;

        match load_error {
            None => Ok(()),
            Some(reason) => Err(NewsError::Navigation(format!("{url}: {reason}"))),
        }
    }

    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> bool {
        let Ok(tab) = self.tab() else {
            return false;
        };
        let result = match locator {
            Locator::Css(css) => {
                let css = css.clone();
                blocking(move || {
                    tab.wait_for_element_with_custom_timeout(&css, timeout)
                        .map(|_| ())
                })
                .await
            }
            other => {
                let Some(xpath) = other.to_xpath() else {
                    return false;
                };
                blocking(move || {
                    tab.wait_for_xpath_with_custom_timeout(&xpath, timeout)
                        .map(|_| ())
                })
                .await
            }
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(?locator, ?timeout, error = %e, "Wait condition not met");
                false
            }
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        let tab = self.tab()?;
        blocking(move || tab.evaluate(SCROLL_TO_BOTTOM, false).map(|_| ())).await
    }

    async fn content(&mut self) -> Result<String> {
        let tab = self.tab()?;
        blocking(move || tab.get_content()).await
    }

    #[instrument(level = "info", skip_all)]
    async fn close(&mut self) -> Result<()> {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = blocking(move || tab.close(true)).await {
                warn!(error = %e, "Closing tab failed; killing browser anyway");
            }
        }
        // Dropping the browser kills the Chrome process.
        if self.browser.take().is_some() {
            info!("Chrome session closed");
        }
        Ok(())
    }
}

async fn blocking<T, E, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(result) => result.map_err(session_error),
        Err(e) => Err(NewsError::Session(format!("browser task aborted: {e}"))),
    }
}

fn session_error(e: impl Display) -> NewsError {
    NewsError::Session(e.to_string())
}
