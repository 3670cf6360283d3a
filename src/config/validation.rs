use crate::categories::category_names;
use crate::config::types::{CacheConfig, Config, ForumConfig, ScrapeConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forum_config(&config.forum)?;
    validate_scrape_config(&config.scrape)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates forum endpoint configuration
fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use HTTPS scheme, got '{}'",
            config.base_url
        )));
    }

    if config.category.is_empty() {
        return Err(ConfigError::Validation("category cannot be empty".to_string()));
    }

    // Unknown categories fail hard later as well, but catching them here
    // gives a message that lists the valid names.
    if !category_names().contains(&config.category.as_str()) {
        return Err(ConfigError::Validation(format!(
            "category '{}' is not known (valid: {})",
            config.category,
            category_names().join(", ")
        )));
    }

    Ok(())
}

/// Validates scrape behavior configuration
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.page_count < 1 {
        return Err(ConfigError::Validation(format!(
            "page-count must be >= 1, got {}",
            config.page_count
        )));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.batch_size < 1 || config.batch_size > 20 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 20, got {}",
            config.batch_size
        )));
    }

    if config.requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "requests-per-second must be positive, got {}",
            config.requests_per_second
        )));
    }

    if config.max_connections < 1 {
        return Err(ConfigError::Validation(format!(
            "max-connections must be >= 1, got {}",
            config.max_connections
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty when caching is enabled".to_string(),
        ));
    }

    if config.expiry_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "expiry-hours must be >= 1, got {}",
            config.expiry_hours
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation("data-dir cannot be empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn valid_config() -> Config {
        Config {
            forum: ForumConfig {
                base_url: "https://forum.cursor.com".to_string(),
                category: "feedback".to_string(),
            },
            scrape: ScrapeConfig {
                page_count: 2,
                page_size: 10,
                max_retries: 3,
                retry_delay_seconds: 2,
                batch_size: 4,
                requests_per_second: 2.0,
                max_connections: 8,
                timeout_seconds: 30,
            },
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_http_base_url_rejected() {
        let mut config = valid_config();
        config.forum.base_url = "http://forum.cursor.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut config = valid_config();
        config.forum.category = "typo-category".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("typo-category"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.scrape.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_rps_rejected() {
        let mut config = valid_config();
        config.scrape.requests_per_second = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut config = valid_config();
        config.cache.expiry_hours = 0;
        assert!(validate(&config).is_err());
    }
}
