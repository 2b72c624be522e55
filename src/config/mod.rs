//! Configuration module
//!
//! This module handles loading, parsing, and validating the engine's TOML
//! configuration, and loading scrape requests from TOML files.
//!
//! # Example
//!
//! ```no_run
//! use fieldscrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fieldscrape.toml")).unwrap();
//! println!("Block cooldown: {}ms", config.rate_limit.block_cooldown_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, DetectorConfig, EngineConfig, FetchConfig, PresetsConfig, RateLimitConfig,
    DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{load_config, load_request, parse_config};
