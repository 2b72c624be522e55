//! Scripted strategies and transports for engine tests

use crate::detector::PageTypeDetector;
use crate::fetch::{FetchStrategy, StrategyKind, Transport, TransportResponse};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves canned results per URL; unknown URLs answer 404
pub struct FakeStrategy {
    kind: StrategyKind,
    pages: Mutex<HashMap<String, FetchResult<String>>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    closes: AtomicUsize,
}

impl FakeStrategy {
    pub fn new(kind: StrategyKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            pages: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn page(self: Arc<Self>, url: &str, result: FetchResult<String>) -> Arc<Self> {
        self.pages.lock().unwrap().insert(url.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn waited_for(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, wait)| wait.clone()).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchStrategy for FakeStrategy {
    async fn fetch_page(
        &self,
        url: &str,
        _timeout: Duration,
        wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), wait_for_selector.map(str::to_string)));

        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            })
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn kind(&self) -> StrategyKind {
        self.kind
    }
}

struct FixedTransport {
    body: String,
}

#[async_trait]
impl Transport for FixedTransport {
    async fn get(
        &self,
        _url: &str,
        _headers: &[(&str, String)],
        _timeout: Duration,
    ) -> FetchResult<TransportResponse> {
        Ok(TransportResponse::new(200, self.body.clone()))
    }
}

/// A detector whose probe always sees `html`
pub fn detector_seeing(html: &str) -> Arc<PageTypeDetector> {
    let transport = Arc::new(FixedTransport {
        body: html.to_string(),
    });
    Arc::new(PageTypeDetector::new(transport, Duration::from_secs(5)))
}
