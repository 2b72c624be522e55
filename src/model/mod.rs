//! Data model shared by every stage of a scrape
//!
//! - `ScrapeRequest` / `FieldSpec`: what to fetch and what to extract
//! - `Record` / `Value`: one extracted item
//! - `ScrapeOutcome`: the structured result handed back to callers
//! - `DetectionResult`: the page type detector's verdict

mod outcome;
mod record;
mod request;
mod validation;

pub use outcome::{DetectionResult, ErrorKind, ScrapeFailure, ScrapeOutcome, ScrapeSuccess};
pub use record::{Record, Value};
pub use request::{FieldSpec, PaginationConfig, ScrapeMode, ScrapeRequest, SelectorKind};
pub use validation::{page_delay, validate_request};
