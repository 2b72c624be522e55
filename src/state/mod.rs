//! State module for per-domain pacing
//!
//! `DomainState` holds the request cadence and block cooldown of one domain.
//! It is plain data with pure transitions; the rate limiter owns the
//! instances and does the waiting.

mod domain_state;

pub use domain_state::DomainState;
