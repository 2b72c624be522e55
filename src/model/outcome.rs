use crate::model::{Record, ScrapeMode};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Result of page type detection. Immutable and never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub is_dynamic: bool,

    /// Confidence in the decision, within [0, 1]
    pub confidence: f64,

    /// Human-readable description of every signal that matched
    pub indicators: Vec<String>,

    pub recommended_mode: ScrapeMode,
}

/// Category of a failed scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad request; no network I/O was attempted
    Validation,
    /// A fetch attempt exceeded its deadline after retries and fallback
    Timeout,
    /// Any other failure
    ScrapeError,
}

/// Records and metadata of a successful scrape
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSuccess {
    /// The URL the request started from
    pub url: String,
    pub data: Vec<Record>,
    /// Strategy name of the first page's fetch
    pub scraper_used: String,
    pub total_items: usize,
    pub pages_scraped: u32,
    pub elapsed_seconds: f64,
    pub finished_at: String,
}

/// Structured description of a failed scrape
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeFailure {
    pub kind: ErrorKind,
    /// Stable machine-readable code
    pub code: String,
    pub message: String,
    pub details: Map<String, JsonValue>,
}

/// Outcome of one `scrape` call: exactly one variant is populated
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Success(ScrapeSuccess),
    Failure(ScrapeFailure),
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&ScrapeSuccess> {
        match self {
            Self::Success(s) => Some(s),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ScrapeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    pub(crate) fn failed(
        kind: ErrorKind,
        code: &str,
        message: impl Into<String>,
        details: Map<String, JsonValue>,
    ) -> Self {
        Self::Failure(ScrapeFailure {
            kind,
            code: code.to_string(),
            message: message.into(),
            details,
        })
    }
}
