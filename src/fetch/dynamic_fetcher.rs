use super::browser::{RenderPage, Renderer, RendererLauncher};
use super::{timeout_seconds, FetchStrategy, RetryPolicy, StrategyKind};
use crate::config::{BrowserConfig, FetchConfig};
use crate::limiter::{blocking_keyword, RateLimiter};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const PAGE_METRICS_SCRIPT: &str =
    "[document.body ? document.body.scrollHeight : 0, window.innerHeight]";

/// Fetches pages rendered by a headless browser
///
/// The browser session is launched on first use and reused by every later
/// call until `close`, or until it can no longer open pages, in which case
/// the next attempt launches a fresh one. Each attempt opens its own page,
/// which is closed again on every exit path.
pub struct DynamicFetcher {
    launcher: Arc<dyn RendererLauncher>,
    session: Mutex<Option<Arc<dyn Renderer>>>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    browser: BrowserConfig,
}

impl DynamicFetcher {
    pub fn new(
        launcher: Arc<dyn RendererLauncher>,
        limiter: Arc<RateLimiter>,
        fetch: &FetchConfig,
        browser: BrowserConfig,
    ) -> Self {
        Self {
            launcher,
            session: Mutex::new(None),
            limiter,
            retry: RetryPolicy::from_config(fetch),
            browser,
        }
    }

    /// Returns the running session, launching it if needed
    ///
    /// The lock is held across the launch so concurrent first callers share
    /// a single session.
    async fn session(&self) -> FetchResult<Arc<dyn Renderer>> {
        let mut session = self.session.lock().await;
        if let Some(renderer) = session.as_ref() {
            return Ok(Arc::clone(renderer));
        }

        tracing::debug!("Launching browser session");
        let renderer = self.launcher.launch().await?;
        *session = Some(Arc::clone(&renderer));
        Ok(renderer)
    }

    /// Drops a session that failed to open a page
    ///
    /// Only the session that failed is dropped; one relaunched meanwhile by a
    /// concurrent attempt is kept.
    async fn discard(&self, renderer: &Arc<dyn Renderer>) {
        let stale = {
            let mut session = self.session.lock().await;
            let is_current = session
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, renderer));
            if is_current {
                session.take()
            } else {
                None
            }
        };

        if let Some(stale) = stale {
            tracing::warn!("Browser session is no longer usable, relaunching on next attempt");
            stale.shutdown().await;
        }
    }

    async fn attempt(
        &self,
        url: &str,
        timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        self.limiter.await_slot(url).await;

        let renderer = self.session().await?;
        let mut page = match renderer.new_page().await {
            Ok(page) => page,
            Err(e) => {
                self.discard(&renderer).await;
                return Err(e);
            }
        };

        tracing::debug!("Rendering {}", url);
        let rendered = tokio::time::timeout(
            timeout,
            self.render(page.as_mut(), url, timeout, wait_for_selector),
        )
        .await;
        page.close().await;

        let html = match rendered {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    seconds: timeout_seconds(timeout),
                })
            }
        };

        if let Some(keyword) = blocking_keyword(&html) {
            tracing::warn!("Rendered page {} mentions '{}', possible block page", url, keyword);
            self.limiter.mark_blocked(url);
        }

        Ok(html)
    }

    async fn render(
        &self,
        page: &mut dyn RenderPage,
        url: &str,
        timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        page.navigate(url).await?;

        if let Some(selector) = wait_for_selector {
            page.wait_for_selector(selector, timeout).await?;
        }

        // Lazy-loaded content only appears once scrolled into view
        if let Err(e) = self.scroll(page).await {
            tracing::debug!("Scrolling {} failed: {}", url, e);
        }

        tokio::time::sleep(Duration::from_millis(self.browser.settle_ms)).await;

        page.html().await
    }

    /// Scrolls to the bottom one viewport at a time, then back to the top
    async fn scroll(&self, page: &mut dyn RenderPage) -> FetchResult<()> {
        let metrics = page.evaluate(PAGE_METRICS_SCRIPT).await?;
        let scroll_height = metrics.get(0).and_then(|v| v.as_f64()).unwrap_or(0.0);
        let viewport = metrics
            .get(1)
            .and_then(|v| v.as_f64())
            .filter(|h| *h > 0.0)
            .unwrap_or_else(|| f64::from(self.browser.viewport_height.max(1)));

        let pause = Duration::from_millis(self.browser.scroll_pause_ms);
        let mut position = 0.0;
        let mut steps = 0;
        while position < scroll_height && steps < self.browser.max_scroll_steps {
            page.evaluate(&format!("window.scrollTo(0, {}); true", position))
                .await?;
            position += viewport;
            steps += 1;
            tokio::time::sleep(pause).await;
        }

        page.evaluate("window.scrollTo(0, 0); true").await?;
        Ok(())
    }
}

#[async_trait]
impl FetchStrategy for DynamicFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        self.retry
            .run(url, |_| true, |_| self.attempt(url, timeout, wait_for_selector))
            .await
    }

    async fn close(&self) {
        let renderer = self.session.lock().await.take();
        if let Some(renderer) = renderer {
            renderer.shutdown().await;
        }
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Dynamic
    }
}
