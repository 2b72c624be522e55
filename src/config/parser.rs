use crate::config::types::EngineConfig;
use crate::config::validation::validate;
use crate::model::ScrapeRequest;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses an engine configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(EngineConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fieldscrape::config::load_config;
///
/// let config = load_config(Path::new("fieldscrape.toml")).unwrap();
/// println!("Min delay: {}ms", config.rate_limit.min_delay_ms);
/// ```
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a scrape request from a TOML file
///
/// Only the file format is checked here; request semantics are validated
/// by the engine so that they surface as a structured outcome.
pub fn load_request(path: &Path) -> Result<ScrapeRequest, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let request: ScrapeRequest = toml::from_str(&content)?;
    Ok(request)
}
