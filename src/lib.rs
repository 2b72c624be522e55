//! fieldscrape: schema-driven web page extraction
//!
//! This crate fetches web pages, extracts structured records according to a
//! declarative field schema, and returns clean, deduplicated data. It decides
//! how to fetch (plain HTTP or a rendered browser, with fallback), when to
//! fetch (adaptive per-domain pacing and block cooldowns), and how to clean
//! what comes back.

pub mod config;
pub mod detector;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod limiter;
pub mod model;
pub mod normalize;
pub mod presets;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("All strategies failed for {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::SelectorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    Url(#[from] ::url::ParseError),

    #[error("Engine setup failed: {0}")]
    Setup(FetchError),
}

impl ScrapeError {
    /// Returns true if the underlying cause is a deadline being exceeded
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if source.is_timeout())
    }

    /// Short tag naming the error variant, reported in failure details
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Fetch { source, .. } => source.type_tag(),
            Self::Extract(_) => "SelectorError",
            Self::Config(_) => "ConfigError",
            Self::Url(_) => "UrlParseError",
            Self::Setup(_) => "SetupError",
        }
    }
}

/// Errors raised by a single fetch strategy or its transport
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Request timeout for {url} after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Browser error for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Transport-level failures that a plain HTTP retry may cure
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TimeoutError",
            Self::Transport { .. } => "TransportError",
            Self::Status { .. } => "HttpStatusError",
            Self::Browser { .. } => "BrowserError",
            Self::BrowserLaunch(_) => "BrowserLaunchError",
        }
    }
}

/// Request validation failures. None of these ever touch the network.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("URL must start with http:// or https:// and include a host: {0}")]
    InvalidUrl(String),

    #[error("At least one extraction field is required")]
    NoFields,

    #[error("Field {0}: name is required")]
    EmptyFieldName(usize),

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),
}

impl ValidationError {
    /// Stable machine-readable code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::NoFields => "NO_FIELDS",
            Self::EmptyFieldName(_) => "EMPTY_FIELD_NAME",
            Self::DuplicateField(_) => "DUPLICATE_FIELD",
            Self::InvalidPagination(_) => "INVALID_PAGINATION",
            Self::InvalidTiming(_) => "INVALID_TIMING",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::EngineConfig;
pub use detector::PageTypeDetector;
pub use engine::{ScraperSelector, ScrapingEngine};
pub use limiter::{is_blocked_response, RateLimiter};
pub use model::{
    DetectionResult, FieldSpec, PaginationConfig, Record, ScrapeMode, ScrapeOutcome,
    ScrapeRequest, SelectorKind, Value,
};
pub use normalize::DataNormalizer;
pub use presets::PresetStore;
