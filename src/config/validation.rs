use crate::config::types::{Config, CrawlerConfig, RetryConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.listing_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing-endpoint: {}", e)))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "listing-endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    if config.site.trim().is_empty() {
        return Err(ConfigError::Validation("site cannot be empty".to_string()));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.download_timeout < 1 {
        return Err(ConfigError::Validation(
            "download-timeout must be at least 1 second".to_string(),
        ));
    }

    validate_pool_size("listing-concurrency", config.listing_concurrency)?;
    validate_pool_size("ingest-concurrency", config.ingest_concurrency)?;

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_pool_size(name: &str, size: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&size) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 100, got {}",
            name, size
        )));
    }
    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.initial_interval == 0 {
        return Err(ConfigError::Validation(
            "retry initial-interval must be > 0ms".to_string(),
        ));
    }

    if config.multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    if config.max_interval < config.initial_interval {
        return Err(ConfigError::Validation(format!(
            "retry max-interval ({}ms) is shorter than initial-interval ({}ms)",
            config.max_interval, config.initial_interval
        )));
    }

    if !(0.0..=1.0).contains(&config.randomization_factor) {
        return Err(ConfigError::Validation(format!(
            "retry randomization-factor must be within 0.0..=1.0, got {}",
            config.randomization_factor
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.image_path.is_empty() {
        return Err(ConfigError::Validation(
            "image-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
