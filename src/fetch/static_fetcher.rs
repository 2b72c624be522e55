use super::{FetchStrategy, RetryPolicy, StrategyKind, Transport};
use crate::config::FetchConfig;
use crate::limiter::{blocking_keyword, is_blocked_response, RateLimiter};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Fetches pages with one plain HTTP GET per attempt
///
/// Transport failures and timeouts are retried with backoff; HTTP error
/// statuses are not.
pub struct StaticFetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, config: &FetchConfig) -> Self {
        Self {
            transport,
            limiter,
            retry: RetryPolicy::from_config(config),
            user_agents: config.user_agents.clone(),
            next_agent: AtomicUsize::new(0),
        }
    }

    /// Next user agent in round-robin order
    fn next_user_agent(&self) -> String {
        if self.user_agents.is_empty() {
            return String::new();
        }
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        self.user_agents[index].clone()
    }

    fn request_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.next_user_agent()),
            ("Accept", ACCEPT.to_string()),
            ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
            ("DNT", "1".to_string()),
            ("Upgrade-Insecure-Requests", "1".to_string()),
        ]
    }

    async fn attempt(&self, url: &str, timeout: Duration) -> FetchResult<String> {
        self.limiter.await_slot(url).await;

        let headers = self.request_headers();
        tracing::debug!("GET {}", url);
        let response = self.transport.get(url, &headers, timeout).await?;

        if is_blocked_response(response.status, &response.body) {
            self.limiter.mark_blocked(url);
        }

        if !response.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        if let Some(keyword) = blocking_keyword(&response.body) {
            tracing::warn!("Response from {} mentions '{}', possible block page", url, keyword);
        }

        Ok(response.body)
    }
}

#[async_trait]
impl FetchStrategy for StaticFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        timeout: Duration,
        _wait_for_selector: Option<&str>,
    ) -> FetchResult<String> {
        self.retry
            .run(url, FetchError::is_transient, |_| self.attempt(url, timeout))
            .await
    }

    async fn close(&self) {
        tracing::debug!("Static fetcher closed");
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Static
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::fetch::TransportResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records the headers it was sent
    struct ScriptedTransport {
        responses: Mutex<VecDeque<FetchResult<TransportResponse>>>,
        seen_agents: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<FetchResult<TransportResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen_agents: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen_agents.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            _url: &str,
            headers: &[(&str, String)],
            _timeout: Duration,
        ) -> FetchResult<TransportResponse> {
            let agent = headers
                .iter()
                .find(|(name, _)| *name == "User-Agent")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            self.seen_agents.lock().unwrap().push(agent);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::new(200, "<p>ok</p>")))
        }
    }

    const URL: &str = "https://shop.example.com/items";

    fn fast_limiter() -> Arc<RateLimiter> {
        RateLimiter::shared(RateLimitConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            requests_before_increase: 10,
            block_cooldown_ms: 60_000,
        })
    }

    fn fetch_config() -> FetchConfig {
        FetchConfig {
            max_attempts: 3,
            backoff_base_ms: 10,
            backoff_cap_ms: 20,
            user_agents: vec!["agent-a".into(), "agent-b".into()],
        }
    }

    fn timeout() -> FetchError {
        FetchError::Timeout {
            url: URL.into(),
            seconds: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_body() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(200, "<h1>Items</h1>"))]);
        let fetcher = StaticFetcher::new(transport.clone(), fast_limiter(), &fetch_config());

        let html = fetcher.fetch_page(URL, Duration::from_secs(5), None).await.unwrap();

        assert_eq!(html, "<h1>Items</h1>");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried_then_surfaced() {
        let transport = ScriptedTransport::new(vec![Err(timeout()), Err(timeout()), Err(timeout())]);
        let fetcher = StaticFetcher::new(transport.clone(), fast_limiter(), &fetch_config());

        let err = fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::Transport {
                url: URL.into(),
                message: "Connection refused".into(),
            }),
            Ok(TransportResponse::new(200, "<p>second</p>")),
        ]);
        let fetcher = StaticFetcher::new(transport.clone(), fast_limiter(), &fetch_config());

        let html = fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap();

        assert_eq!(html, "<p>second</p>");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(404, "missing"))]);
        let fetcher = StaticFetcher::new(transport.clone(), fast_limiter(), &fetch_config());

        let err = fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Status {
                url: URL.into(),
                status: 404
            }
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_status_marks_domain() {
        let limiter = fast_limiter();
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(429, ""))]);
        let fetcher = StaticFetcher::new(transport, limiter.clone(), &fetch_config());

        let err = fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 429, .. }));
        assert!(limiter.is_blocked(URL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_challenge_page_marks_domain_but_returns_body() {
        let limiter = fast_limiter();
        let transport =
            ScriptedTransport::new(vec![Ok(TransportResponse::new(200, "Please solve the CAPTCHA"))]);
        let fetcher = StaticFetcher::new(transport, limiter.clone(), &fetch_config());

        let html = fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap();

        assert_eq!(html, "Please solve the CAPTCHA");
        assert!(limiter.is_blocked(URL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_agents_rotate_round_robin() {
        let transport = ScriptedTransport::new(vec![]);
        let fetcher = StaticFetcher::new(transport.clone(), fast_limiter(), &fetch_config());

        for _ in 0..3 {
            fetcher.fetch_page(URL, Duration::from_secs(1), None).await.unwrap();
        }

        let seen = transport.seen_agents.lock().unwrap().clone();
        assert_eq!(seen, vec!["agent-a", "agent-b", "agent-a"]);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let fetcher = StaticFetcher::new(ScriptedTransport::new(vec![]), fast_limiter(), &fetch_config());
        fetcher.close().await;
        fetcher.close().await;
        assert_eq!(fetcher.kind(), StrategyKind::Static);
    }
}
