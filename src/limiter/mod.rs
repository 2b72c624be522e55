//! Rate limiting module
//!
//! `RateLimiter` paces requests per domain and enforces cooldowns after a
//! domain blocks us. `is_blocked_response` decides what counts as a block.

mod blocking;
mod rate_limiter;

pub use blocking::{blocking_keyword, is_blocked_response};
pub use rate_limiter::RateLimiter;
