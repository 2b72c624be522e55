//! Page fetching strategies
//!
//! This module provides the two ways a page can be fetched:
//! - `StaticFetcher`: one plain HTTP GET per attempt
//! - `DynamicFetcher`: a page rendered in a headless browser session
//!
//! Both share the retry policy in `retry`, consult the `RateLimiter` before
//! every attempt and report block signals back to it.

pub mod browser;
mod dynamic_fetcher;
mod retry;
mod static_fetcher;
mod transport;

pub use dynamic_fetcher::DynamicFetcher;
pub use retry::RetryPolicy;
pub use static_fetcher::StaticFetcher;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

use crate::FetchResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Which way a strategy fetches pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Static,
    Dynamic,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Static => "static",
            StrategyKind::Dynamic => "dynamic",
        }
    }

    /// The strategy used when this one fails
    pub fn other(self) -> Self {
        match self {
            StrategyKind::Static => StrategyKind::Dynamic,
            StrategyKind::Dynamic => StrategyKind::Static,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A way of turning a URL into HTML
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetches the page, retrying per the strategy's policy
    ///
    /// `wait_for_selector` only has an effect for strategies that execute
    /// scripts.
    async fn fetch_page(
        &self,
        url: &str,
        timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> FetchResult<String>;

    /// Releases held resources. Idempotent, and safe if never used.
    async fn close(&self);

    fn kind(&self) -> StrategyKind;
}

/// Whole seconds reported for a timeout, rounded up so sub-second
/// timeouts never read as zero
pub(crate) fn timeout_seconds(timeout: Duration) -> u64 {
    let whole = timeout.as_secs();
    if timeout.subsec_nanos() > 0 {
        whole + 1
    } else {
        whole
    }
}
