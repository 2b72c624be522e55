//! Scrape orchestration
//!
//! This module ties the pipeline together:
//! - `ScraperSelector`: strategy choice and fallback for one page
//! - `ScrapingEngine`: validation, pagination, normalisation and outcomes

mod coordinator;
mod selector;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::ScrapingEngine;
pub use selector::ScraperSelector;
