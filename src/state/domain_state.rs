use crate::config::RateLimitConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks the pacing state of a single domain
///
/// Owned exclusively by the rate limiter. A domain moves between two states:
/// normal, and cooling down after it signalled that we were blocked.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// The slot most recently handed out for this domain
    pub last_request_at: Option<Instant>,

    /// Requests made since the state was created or the last block
    pub request_count: u32,

    /// End of the current block cooldown, if any
    pub blocked_until: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay enforced between two requests at the current request count
    ///
    /// The delay stays at the minimum until the count exceeds the configured
    /// threshold, then grows in steps of 50% per threshold multiple, capped
    /// at five steps and at the maximum delay.
    pub fn current_delay(&self, config: &RateLimitConfig) -> Duration {
        let min_delay = config.min_delay();
        let threshold = config.requests_before_increase.max(1);

        if self.request_count <= threshold {
            return min_delay;
        }

        let steps = (self.request_count / threshold).min(5);
        let stepped = min_delay.mul_f64(1.0 + 0.5 * f64::from(steps));
        stepped.min(config.max_delay())
    }

    /// Returns true while the block cooldown is running
    pub fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    /// Drops an expired cooldown
    pub fn clear_expired_block(&mut self, now: Instant) {
        if !self.is_blocked(now) {
            self.blocked_until = None;
        }
    }

    /// Computes and reserves the next slot for this domain
    ///
    /// The slot is the earliest instant that respects both the cooldown and
    /// the pacing delay since the previously reserved slot. Reserving stamps
    /// the slot as the last request time and increments the request count.
    pub fn reserve_slot(&mut self, config: &RateLimitConfig, now: Instant) -> Instant {
        let mut ready = now;

        if let Some(until) = self.blocked_until {
            ready = ready.max(until);
        }

        let delay = self.current_delay(config);
        if let Some(last) = self.last_request_at {
            ready = ready.max(last + delay);
        }

        self.last_request_at = Some(ready);
        self.request_count += 1;
        self.clear_expired_block(now);
        ready
    }

    /// Starts a cooldown and restarts pacing from the minimum delay
    pub fn mark_blocked(&mut self, now: Instant, cooldown: Duration) {
        self.blocked_until = Some(now + cooldown);
        self.request_count = 0;
    }

    /// Time left before a request could be made, if any
    pub fn time_until_next_request(&self, config: &RateLimitConfig, now: Instant) -> Option<Duration> {
        let mut ready = now;
        if let Some(until) = self.blocked_until {
            ready = ready.max(until);
        }
        if let Some(last) = self.last_request_at {
            ready = ready.max(last + self.current_delay(config));
        }
        (ready > now).then(|| ready - now)
    }
}
