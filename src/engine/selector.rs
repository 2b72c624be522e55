use crate::detector::PageTypeDetector;
use crate::fetch::{FetchStrategy, StrategyKind};
use crate::model::ScrapeMode;
use crate::{Result, ScrapeError};
use std::sync::Arc;
use std::time::Duration;

/// Picks the fetch strategy for a page and falls back to the other one
///
/// STATIC tries plain HTTP first, DYNAMIC the browser first, and AUTO asks
/// the detector which to try first. At most two strategies run per page;
/// the first success wins.
pub struct ScraperSelector {
    static_strategy: Arc<dyn FetchStrategy>,
    dynamic_strategy: Arc<dyn FetchStrategy>,
    detector: Arc<PageTypeDetector>,
}

impl ScraperSelector {
    pub fn new(
        static_strategy: Arc<dyn FetchStrategy>,
        dynamic_strategy: Arc<dyn FetchStrategy>,
        detector: Arc<PageTypeDetector>,
    ) -> Self {
        Self {
            static_strategy,
            dynamic_strategy,
            detector,
        }
    }

    fn strategy(&self, kind: StrategyKind) -> &Arc<dyn FetchStrategy> {
        match kind {
            StrategyKind::Static => &self.static_strategy,
            StrategyKind::Dynamic => &self.dynamic_strategy,
        }
    }

    /// The strategy tried first for `url` under `mode`
    pub async fn primary_for(&self, url: &str, mode: ScrapeMode) -> StrategyKind {
        match mode {
            ScrapeMode::Static => StrategyKind::Static,
            ScrapeMode::Dynamic => StrategyKind::Dynamic,
            ScrapeMode::Auto => {
                let detection = self.detector.detect(url).await;
                tracing::info!(
                    "Auto mode chose {:?} for {} (confidence {:.2})",
                    detection.recommended_mode,
                    url,
                    detection.confidence
                );
                if detection.is_dynamic {
                    StrategyKind::Dynamic
                } else {
                    StrategyKind::Static
                }
            }
        }
    }

    /// Fetches the page, returning its HTML and the name of the strategy
    /// that produced it
    ///
    /// If both strategies fail, the fallback's error is returned.
    pub async fn select_and_fetch(
        &self,
        url: &str,
        mode: ScrapeMode,
        timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> Result<(String, String)> {
        let primary = self.primary_for(url, mode).await;

        match self
            .strategy(primary)
            .fetch_page(url, timeout, wait_for_selector)
            .await
        {
            Ok(html) => return Ok((html, primary.name().to_string())),
            Err(e) => tracing::warn!(
                "{} strategy failed for {}: {}; falling back to {}",
                primary,
                url,
                e,
                primary.other()
            ),
        }

        let fallback = primary.other();
        self.strategy(fallback)
            .fetch_page(url, timeout, wait_for_selector)
            .await
            .map(|html| (html, format!("{} (fallback)", fallback)))
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })
    }

    /// Closes both strategies
    pub async fn cleanup_all(&self) {
        self.static_strategy.close().await;
        self.dynamic_strategy.close().await;
        tracing::debug!("Closed all fetch strategies");
    }
}
