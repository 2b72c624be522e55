//! Chromium session via chromiumoxide

use super::{RenderPage, Renderer, RendererLauncher};
use crate::fetch::timeout_seconds;
use crate::config::BrowserConfig;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between selector probes in `wait_for_selector`
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn browser_error(url: &str, e: CdpError) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        message: e.to_string(),
    }
}

/// Launches headless Chromium with the configured window and user agent
pub struct ChromiumLauncher {
    config: BrowserConfig,
    user_agent: String,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl RendererLauncher for ChromiumLauncher {
    async fn launch(&self) -> FetchResult<Arc<dyn Renderer>> {
        let renderer = ChromiumRenderer::launch(&self.config, &self.user_agent).await?;
        Ok(Arc::new(renderer))
    }
}

/// A running headless Chromium instance
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    pub async fn launch(config: &BrowserConfig, user_agent: &str) -> FetchResult<Self> {
        let mut builder = CdpBrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-infobars")
            .arg(format!("--user-agent={}", user_agent));

        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| FetchError::BrowserLaunch(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Launched headless browser session");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_page(&self) -> FetchResult<Box<dyn RenderPage>> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| FetchError::BrowserLaunch("browser session already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error("about:blank", e))?;

        Ok(Box::new(ChromiumPage {
            page,
            url: String::from("about:blank"),
        }))
    }

    async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Browser process wait failed: {}", e);
            }
        }
        self.handler.abort();
        tracing::info!("Browser session closed");
    }
}

/// One Chromium tab
struct ChromiumPage {
    page: Page,
    /// Last navigation target, for error messages
    url: String,
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> FetchResult<()> {
        self.url = url.to_string();

        self.page.goto(url).await.map_err(|e| browser_error(url, e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| browser_error(url, e))?;

        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(FetchError::Timeout {
                    url: self.url.clone(),
                    seconds: timeout_seconds(timeout),
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&mut self, script: &str) -> FetchResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| browser_error(&self.url, e))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn html(&mut self) -> FetchResult<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| browser_error(&self.url, e))?;

        result.into_value::<String>().map_err(|e| FetchError::Browser {
            url: self.url.clone(),
            message: format!("failed to read document HTML: {}", e),
        })
    }

    async fn close(self: Box<Self>) {
        let ChromiumPage { page, url } = *self;
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }
    }
}
