//! Integration tests for the scraping engine
//!
//! These tests use wiremock to serve pages to the real reqwest-backed
//! static strategy. The browser strategy is replaced with a stub so no
//! Chromium binary is needed.

use async_trait::async_trait;
use fieldscrape::config::{FetchConfig, RateLimitConfig};
use fieldscrape::fetch::{FetchStrategy, ReqwestTransport, StaticFetcher, StrategyKind, Transport};
use fieldscrape::model::ErrorKind;
use fieldscrape::{
    FetchError, FetchResult, FieldSpec, PageTypeDetector, PresetStore, RateLimiter, ScrapeMode,
    ScrapeRequest, ScrapingEngine, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Browser strategy stand-in with a fixed answer
struct StubDynamic {
    result: FetchResult<String>,
    calls: AtomicUsize,
}

impl StubDynamic {
    fn serving(html: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(html.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: FetchError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchStrategy for StubDynamic {
    async fn fetch_page(
        &self,
        _url: &str,
        _timeout: Duration,
        _wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    async fn close(&self) {}

    fn kind(&self) -> StrategyKind {
        StrategyKind::Dynamic
    }
}

/// Creates a pacing configuration short enough for tests
fn create_test_rate_limit() -> RateLimitConfig {
    RateLimitConfig {
        min_delay_ms: 10,
        max_delay_ms: 50,
        requests_before_increase: 10,
        block_cooldown_ms: 60_000,
    }
}

fn create_test_fetch_config() -> FetchConfig {
    FetchConfig {
        max_attempts: 2,
        backoff_base_ms: 10,
        backoff_cap_ms: 20,
        user_agents: vec!["TestAgent/1.0".to_string()],
    }
}

/// Builds an engine with a real static strategy and the given browser stub
fn create_test_engine(dynamic: Arc<StubDynamic>) -> (ScrapingEngine, Arc<RateLimiter>) {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new().unwrap());
    let limiter = RateLimiter::shared(create_test_rate_limit());
    let static_strategy = Arc::new(StaticFetcher::new(
        Arc::clone(&transport),
        Arc::clone(&limiter),
        &create_test_fetch_config(),
    ));
    let detector = Arc::new(PageTypeDetector::new(transport, Duration::from_secs(5)));

    let engine = ScrapingEngine::from_parts(
        static_strategy,
        dynamic,
        detector,
        PresetStore::builtin().unwrap(),
    );
    (engine, limiter)
}

fn item_request(url: String) -> ScrapeRequest {
    let mut request = ScrapeRequest::new(
        url,
        vec![
            FieldSpec::css("name", ".name"),
            FieldSpec::css("price", ".price"),
            FieldSpec::css("image", "img").with_attribute("src"),
        ],
    )
    .with_mode(ScrapeMode::Static)
    .with_container(".item");
    request.delay_seconds = 0.0;
    request.timeout_seconds = 5;
    request
}

fn item_page(names: &[&str], next: Option<&str>) -> String {
    let items: String = names
        .iter()
        .map(|name| {
            format!(
                r#"<div class="item"><span class="name">{}</span><span class="price">$ 1 0</span><img src="/img/{}.png"></div>"#,
                name, name
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", items, next)
}

#[tokio::test]
async fn test_static_scrape_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("User-Agent", "TestAgent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page(&["lamp", "desk"], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dynamic = StubDynamic::serving("");
    let (engine, _) = create_test_engine(Arc::clone(&dynamic));

    let url = format!("{}/products", mock_server.uri());
    let outcome = engine.scrape(&item_request(url.clone())).await;

    let success = outcome.success().expect("scrape should succeed");
    assert_eq!(success.total_items, 2);
    assert_eq!(success.pages_scraped, 1);
    assert_eq!(success.scraper_used, "static");
    assert_eq!(success.data[0].get("name"), Some(&Value::from("lamp")));
    assert_eq!(success.data[0].get("price"), Some(&Value::from("$10")));
    assert_eq!(
        success.data[1].get("image"),
        Some(&Value::from(format!("{}/img/desk.png", mock_server.uri()).as_str()))
    );
    assert_eq!(dynamic.calls(), 0);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["total_items"], 2);
    assert_eq!(json["data"][0]["name"], "lamp");
}

#[tokio::test]
async fn test_invalid_request_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dynamic = StubDynamic::serving("");
    let (engine, _) = create_test_engine(Arc::clone(&dynamic));

    let request = ScrapeRequest::new(mock_server.uri(), vec![]);
    let outcome = engine.scrape(&request).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::Validation);
    assert_eq!(failure.code, "NO_FIELDS");
    assert_eq!(dynamic.calls(), 0);
}

#[tokio::test]
async fn test_static_timeout_falls_back_to_dynamic() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(item_page(&["late"], None))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let dynamic = StubDynamic::serving(&item_page(&["rendered"], None));
    let (engine, _) = create_test_engine(Arc::clone(&dynamic));

    let mut request = item_request(format!("{}/slow", mock_server.uri()));
    request.timeout_seconds = 1;
    let outcome = engine.scrape(&request).await;

    let success = outcome.success().unwrap();
    assert_eq!(success.scraper_used, "dynamic (fallback)");
    assert_eq!(success.data[0].get("name"), Some(&Value::from("rendered")));
    assert_eq!(dynamic.calls(), 1);
}

#[tokio::test]
async fn test_timeout_on_both_strategies_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let dynamic = StubDynamic::failing(FetchError::Timeout {
        url: url.clone(),
        seconds: 1,
    });
    let (engine, _) = create_test_engine(dynamic);

    let mut request = item_request(url);
    request.timeout_seconds = 1;
    let outcome = engine.scrape(&request).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::Timeout);
    assert_eq!(failure.message, "Request timed out after 1 seconds");
}

#[tokio::test]
async fn test_pagination_across_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page(&["a", "b"], Some("/list/2"))))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page(&["c"], Some("3"))))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_page(&["d"], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (engine, _) = create_test_engine(StubDynamic::serving(""));

    let request =
        item_request(format!("{}/list", mock_server.uri())).with_pagination("a.next", 10);
    let outcome = engine.scrape(&request).await;

    let success = outcome.success().unwrap();
    assert_eq!(success.pages_scraped, 3);
    assert_eq!(success.total_items, 4);
    let names: Vec<_> = success
        .data
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_text))
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let dynamic = StubDynamic::failing(FetchError::Browser {
        url: url.clone(),
        message: "navigation failed".to_string(),
    });
    let (engine, _) = create_test_engine(Arc::clone(&dynamic));

    let outcome = engine.scrape(&item_request(url)).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::ScrapeError);
    assert_eq!(failure.code, "SCRAPE_ERROR");
    assert_eq!(failure.details["error_type"], "BrowserError");
    assert_eq!(dynamic.calls(), 1);
}

#[tokio::test]
async fn test_rate_limited_response_blocks_domain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/busy", mock_server.uri());
    let dynamic = StubDynamic::failing(FetchError::BrowserLaunch("no browser".to_string()));
    let (engine, limiter) = create_test_engine(dynamic);

    let outcome = engine.scrape(&item_request(url.clone())).await;

    assert!(!outcome.is_success());
    assert!(limiter.is_blocked(&url));
}

#[tokio::test]
async fn test_auto_mode_detects_static_page() {
    let mock_server = MockServer::start().await;

    let body = format!(
        "<html><body><article><p>{}</p></article>{}</body></html>",
        "plenty of server rendered words ".repeat(80),
        item_page(&["x"], None)
    );
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let dynamic = StubDynamic::serving("");
    let (engine, _) = create_test_engine(Arc::clone(&dynamic));

    let url = format!("{}/article", mock_server.uri());
    let detection = engine.detect_page_type(&url).await;
    assert!(!detection.is_dynamic);

    let request = item_request(url).with_mode(ScrapeMode::Auto);
    let outcome = engine.scrape(&request).await;

    assert_eq!(outcome.success().unwrap().scraper_used, "static");
    assert_eq!(dynamic.calls(), 0);
}
