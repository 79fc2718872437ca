use crate::config::types::{Config, EngineConfig, MatchingConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_matching_config(&config.matching)?;
    Ok(())
}

/// Validates fetch, retry and cache settings
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.catalog_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "catalog_path cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache_ttl_secs must be > 0".to_string(),
        ));
    }

    if config.search_deadline_secs < config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "search_deadline_secs ({}) must be >= request_timeout_secs ({})",
            config.search_deadline_secs, config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates relevance settings
fn validate_matching_config(config: &MatchingConfig) -> Result<(), ConfigError> {
    if !(config.threshold > 0.0 && config.threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "threshold must be in (0, 1], got {}",
            config.threshold
        )));
    }

    if !(0.0..=1.0).contains(&config.min_match_ratio) {
        return Err(ConfigError::Validation(format!(
            "min_match_ratio must be in [0, 1], got {}",
            config.min_match_ratio
        )));
    }

    if config.max_results_per_source < 1 {
        return Err(ConfigError::Validation(
            "max_results_per_source must be >= 1".to_string(),
        ));
    }

    Ok(())
}
