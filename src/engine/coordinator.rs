//! Scraping engine - request orchestration
//!
//! One `scrape` call runs the whole pipeline:
//! - validating the request before any network I/O
//! - fetching each page through the strategy selector
//! - extracting records and following the next-page link
//! - normalising and deduplicating the combined records
//! - turning any error into a structured failure outcome

use super::ScraperSelector;
use crate::config::{EngineConfig, DEFAULT_USER_AGENTS};
use crate::detector::PageTypeDetector;
use crate::extract;
use crate::fetch::browser::ChromiumLauncher;
use crate::fetch::{DynamicFetcher, FetchStrategy, ReqwestTransport, StaticFetcher, Transport};
use crate::limiter::RateLimiter;
use crate::model::{
    page_delay, validate_request, DetectionResult, ErrorKind, Record, ScrapeOutcome,
    ScrapeRequest, ScrapeSuccess,
};
use crate::normalize::DataNormalizer;
use crate::presets::{Category, Preset, PresetStore, PresetSummary};
use crate::url::resolve_link;
use crate::{Result, ScrapeError, ValidationError};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Records gathered by the pagination loop, before normalisation
struct Collected {
    records: Vec<Record>,
    scraper_used: String,
    pages_scraped: u32,
}

/// Entry point for scrape requests
///
/// Owns both fetch strategies (which share one rate limiter), the page type
/// detector and the preset catalogue. Safe to share across tasks; call
/// `shutdown` once when done to release the browser session.
pub struct ScrapingEngine {
    selector: ScraperSelector,
    detector: Arc<PageTypeDetector>,
    presets: PresetStore,
}

impl ScrapingEngine {
    /// Builds the production engine: reqwest for plain HTTP, headless
    /// Chromium for rendering
    ///
    /// The browser is not started until the first dynamic fetch.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new().map_err(ScrapeError::Setup)?);
        let limiter = RateLimiter::shared(config.rate_limit.clone());

        let user_agent = config
            .fetch
            .user_agents
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string());
        let launcher = Arc::new(ChromiumLauncher::new(config.browser.clone(), user_agent));

        let static_strategy = Arc::new(StaticFetcher::new(
            Arc::clone(&transport),
            Arc::clone(&limiter),
            &config.fetch,
        ));
        let dynamic_strategy = Arc::new(DynamicFetcher::new(
            launcher,
            limiter,
            &config.fetch,
            config.browser.clone(),
        ));
        let detector = Arc::new(PageTypeDetector::new(
            transport,
            Duration::from_secs(config.detector.timeout_secs),
        ));

        let presets = match &config.presets.custom_dir {
            Some(dir) => PresetStore::with_custom_dir(dir)?,
            None => PresetStore::builtin()?,
        };

        Ok(Self::from_parts(static_strategy, dynamic_strategy, detector, presets))
    }

    /// Assembles an engine from explicitly constructed parts
    pub fn from_parts(
        static_strategy: Arc<dyn FetchStrategy>,
        dynamic_strategy: Arc<dyn FetchStrategy>,
        detector: Arc<PageTypeDetector>,
        presets: PresetStore,
    ) -> Self {
        Self {
            selector: ScraperSelector::new(static_strategy, dynamic_strategy, Arc::clone(&detector)),
            detector,
            presets,
        }
    }

    /// Runs one scrape request to completion
    ///
    /// Never panics on bad input; every error becomes a failure outcome.
    /// There is no partial success: an error on any page fails the request.
    pub async fn scrape(&self, request: &ScrapeRequest) -> ScrapeOutcome {
        if let Err(e) = validate_request(request) {
            tracing::warn!("Rejected request for {}: {}", request.url, e);
            return validation_failure(request, &e);
        }

        let started = Instant::now();
        tracing::info!("Scraping {} in {:?} mode", request.url, request.mode);

        let collected = match self.collect(request).await {
            Ok(collected) => collected,
            Err(e) => {
                tracing::error!("Scrape of {} failed: {}", request.url, e);
                return error_failure(request, &e);
            }
        };

        let normalizer = DataNormalizer::new(Some(request.url.trim()));
        let data = normalizer.normalize(collected.records, true);
        let elapsed = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;

        tracing::info!(
            "Scraped {} records from {} pages of {} in {:.2}s",
            data.len(),
            collected.pages_scraped,
            request.url,
            elapsed
        );

        ScrapeOutcome::Success(ScrapeSuccess {
            url: request.url.clone(),
            total_items: data.len(),
            data,
            scraper_used: collected.scraper_used,
            pages_scraped: collected.pages_scraped,
            elapsed_seconds: elapsed,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// The pagination loop
    async fn collect(&self, request: &ScrapeRequest) -> Result<Collected> {
        let timeout = Duration::from_secs(request.timeout_seconds);
        let delay = page_delay(request)?;
        let budget = request.pagination.page_budget();
        let next_page_selector = request
            .pagination
            .next_page_selector
            .as_deref()
            .filter(|_| request.pagination.enabled);

        let mut current = Url::parse(request.url.trim())?;
        let mut visited = HashSet::from([current.to_string()]);
        let mut records = Vec::new();
        let mut scraper_used = None;
        let mut pages_scraped = 0;

        loop {
            let (html, strategy) = self
                .selector
                .select_and_fetch(
                    current.as_str(),
                    request.mode,
                    timeout,
                    request.wait_for_selector.as_deref(),
                )
                .await?;

            let page = extract::extract_page(
                &html,
                &request.fields,
                request.container_selector.as_deref(),
                next_page_selector,
            )?;

            pages_scraped += 1;
            tracing::info!(
                "Page {} ({}) via {}: {} records",
                pages_scraped,
                current,
                strategy,
                page.records.len()
            );
            scraper_used.get_or_insert(strategy);
            records.extend(page.records);

            if pages_scraped >= budget {
                break;
            }

            let Some(next) = page.next_href.and_then(|href| resolve_link(&href, &current)) else {
                tracing::debug!("No next page after {}", current);
                break;
            };
            if !visited.insert(next.clone()) {
                tracing::debug!("Next page {} was already visited, stopping", next);
                break;
            }

            tokio::time::sleep(delay).await;
            current = Url::parse(&next)?;
        }

        Ok(Collected {
            records,
            scraper_used: scraper_used.unwrap_or_default(),
            pages_scraped,
        })
    }

    /// Runs the page type detector on its own
    pub async fn detect_page_type(&self, url: &str) -> DetectionResult {
        self.detector.detect(url).await
    }

    pub fn presets(&self, category: Option<&str>) -> Vec<PresetSummary> {
        self.presets.list(category)
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.lookup(id)
    }

    pub fn categories(&self) -> &[Category] {
        self.presets.categories()
    }

    pub fn suggest_presets(&self, url: &str) -> Vec<PresetSummary> {
        self.presets.suggest_for_url(url)
    }

    /// Releases both strategies. Idempotent.
    pub async fn shutdown(&self) {
        self.selector.cleanup_all().await;
    }
}

fn validation_failure(request: &ScrapeRequest, error: &ValidationError) -> ScrapeOutcome {
    let mut details = Map::new();
    details.insert("url".into(), JsonValue::from(request.url.clone()));

    ScrapeOutcome::failed(ErrorKind::Validation, error.code(), error.to_string(), details)
}

fn error_failure(request: &ScrapeRequest, error: &ScrapeError) -> ScrapeOutcome {
    let mut details = Map::new();
    details.insert("url".into(), JsonValue::from(request.url.clone()));

    if error.is_timeout() {
        details.insert("timeout".into(), JsonValue::from(request.timeout_seconds));
        return ScrapeOutcome::failed(
            ErrorKind::Timeout,
            "TIMEOUT",
            format!("Request timed out after {} seconds", request.timeout_seconds),
            details,
        );
    }

    details.insert("error_type".into(), JsonValue::from(error.type_tag()));
    ScrapeOutcome::failed(ErrorKind::ScrapeError, "SCRAPE_ERROR", error.to_string(), details)
}
