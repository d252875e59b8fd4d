use crate::config::types::{
    Config, CrawlerConfig, SearchConfig, SeedEntry, StorageConfig, UserAgentConfig,
};
use crate::url::normalize_seed_url;
use crate::ConfigError;
use url::Url;

/// Upper bound on `stall_timeout` (one year)
const MAX_STALL_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_config(&config.search)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 1000, got {}",
            config.batch_size
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    // Idle polling below this turns into a busy loop against the database
    if config.idle_sleep < 100 {
        return Err(ConfigError::Validation(format!(
            "idle_sleep must be >= 100ms, got {}ms",
            config.idle_sleep
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1s".to_string(),
        ));
    }

    if config.connect_timeout < 1 || config.connect_timeout > config.request_timeout {
        return Err(ConfigError::Validation(format!(
            "connect_timeout must be between 1s and request_timeout ({}s), got {}s",
            config.request_timeout, config.connect_timeout
        )));
    }

    if config.stall_timeout < 1 || config.stall_timeout > MAX_STALL_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "stall_timeout must be between 1s and {}s, got {}s",
            MAX_STALL_TIMEOUT_SECS, config.stall_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates storage configuration
///
/// The database path is the only connection setting; without it the
/// process cannot start.
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.snippet_length < 1 {
        return Err(ConfigError::Validation(
            "snippet_length must be >= 1".to_string(),
        ));
    }

    if config.max_limit < 1 {
        return Err(ConfigError::Validation(
            "max_limit must be >= 1".to_string(),
        ));
    }

    if config.default_limit < 1 || config.default_limit > config.max_limit {
        return Err(ConfigError::Validation(format!(
            "default_limit must be between 1 and max_limit ({}), got {}",
            config.max_limit, config.default_limit
        )));
    }

    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    for seed in seeds {
        normalize_seed_url(&seed.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e))
        })?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
