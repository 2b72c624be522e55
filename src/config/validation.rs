use crate::config::types::{BrowserConfig, EngineConfig, FetchConfig, RateLimitConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    validate_rate_limit(&config.rate_limit)?;
    validate_fetch(&config.fetch)?;
    validate_browser(&config.browser)?;

    if config.detector.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "detector timeout-secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.max_delay_ms < config.min_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must be >= min-delay-ms ({})",
            config.max_delay_ms, config.min_delay_ms
        )));
    }

    if config.requests_before_increase < 1 {
        return Err(ConfigError::Validation(
            "requests-before-increase must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetch(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_cap_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-cap-ms ({}) must be >= backoff-base-ms ({})",
            config.backoff_cap_ms, config.backoff_base_ms
        )));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents cannot be empty".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }
    Ok(())
}
