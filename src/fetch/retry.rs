use crate::config::FetchConfig;
use crate::{FetchError, FetchResult};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with capped exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
        }
    }

    /// Wait after failed attempt `attempt` (1-based): `min(base * 2^(n-1), cap)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base
            .saturating_mul(1u32 << exponent)
            .min(self.cap)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts. The last error is returned unaltered.
    pub async fn run<T, F, Fut, R>(&self, url: &str, retryable: R, mut operation: F) -> FetchResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = FetchResult<T>>,
        R: Fn(&FetchError) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && retryable(&e) => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        url,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base: Duration::from_secs(2),
            cap: Duration::from_secs(10),
        }
    }

    fn timeout_error() -> FetchError {
        FetchError::Timeout {
            url: "https://example.com".into(),
            seconds: 1,
        }
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(4), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[test]
    fn test_default_matches_fetch_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base, Duration::from_secs(2));
        assert_eq!(policy.cap, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_attempts_exhausted() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: FetchResult<()> = policy()
            .run("https://example.com", |_| true, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(timeout_error()) }
            })
            .await;

        assert_eq!(result, Err(timeout_error()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2s after the first failure, 4s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_success() {
        let result = policy()
            .run("https://example.com", |_| true, |attempt| async move {
                if attempt < 2 {
                    Err(timeout_error())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let status = FetchError::Status {
            url: "https://example.com".into(),
            status: 404,
        };

        let result: FetchResult<()> = policy()
            .run("https://example.com", FetchError::is_transient, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                let status = status.clone();
                async move { Err(status) }
            })
            .await;

        assert_eq!(result, Err(status));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
