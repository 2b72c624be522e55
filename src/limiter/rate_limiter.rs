use crate::config::RateLimitConfig;
use crate::state::DomainState;
use crate::url::domain_key;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};

/// Per-domain request pacing with block cooldowns
///
/// The limiter is shared by every fetch strategy of one engine. The timing
/// decision for a request is taken while holding the domain's map entry,
/// and the wait happens after the entry is released, so:
/// - concurrent callers for one domain receive slots at least one delay apart
/// - different domains never wait on each other
pub struct RateLimiter {
    /// Pacing state keyed by lower-cased host (and port)
    domains: DashMap<String, DomainState>,

    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            domains: DashMap::new(),
            config,
        }
    }

    /// Convenience constructor for sharing between strategies
    pub fn shared(config: RateLimitConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Waits until a request to the URL's domain is allowed
    ///
    /// Returns after reserving a slot; the caller should issue its request
    /// right away.
    pub async fn await_slot(&self, url: &str) {
        let domain = domain_key(url);

        let ready = {
            let mut state = self.domains.entry(domain.clone()).or_default();
            state.reserve_slot(&self.config, Instant::now())
        };

        let now = Instant::now();
        if ready > now {
            tracing::debug!("Waiting {:?} before next request to {}", ready - now, domain);
            sleep_until(ready).await;
        }

        // A block may have been registered while we slept
        loop {
            let blocked_until = self
                .domains
                .get(&domain)
                .and_then(|state| state.blocked_until)
                .filter(|until| *until > Instant::now());

            match blocked_until {
                Some(until) => {
                    tracing::debug!("Domain {} blocked, waiting for cooldown", domain);
                    sleep_until(until).await;
                }
                None => break,
            }
        }
    }

    /// Starts the cooldown for the URL's domain
    pub fn mark_blocked(&self, url: &str) {
        let domain = domain_key(url);
        let cooldown = self.config.block_cooldown();

        tracing::warn!("Domain {} appears to be blocking, cooling down for {:?}", domain, cooldown);

        self.domains
            .entry(domain)
            .or_default()
            .mark_blocked(Instant::now(), cooldown);
    }

    /// True while the URL's domain is cooling down
    pub fn is_blocked(&self, url: &str) -> bool {
        let domain = domain_key(url);
        let now = Instant::now();

        match self.domains.get_mut(&domain) {
            Some(mut state) => {
                state.clear_expired_block(now);
                state.is_blocked(now)
            }
            None => false,
        }
    }

    /// Forgets all pacing state for the URL's domain
    pub fn reset(&self, url: &str) {
        let domain = domain_key(url);
        if self.domains.remove(&domain).is_some() {
            tracing::debug!("Reset rate limit state for {}", domain);
        }
    }

    /// Snapshot of the URL's domain state, if it has one
    pub fn domain_state(&self, url: &str) -> Option<DomainState> {
        self.domains.get(&domain_key(url)).map(|state| state.clone())
    }

    /// Number of domains currently tracked
    pub fn tracked_domains(&self) -> usize {
        self.domains.len()
    }
}
