use crate::config::types::{Config, CrawlerConfig, IdentityConfig, OutputConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on parallel requests; the target should only ever see a trickle
const MAX_CONCURRENCY_CEILING: u32 = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_crawler_config(&config.crawler)?;
    validate_identity_config(&config.identity)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if let Some(start_url) = &config.start_url {
        validate_http_url(start_url, "start_url")?;
    }

    let radius: f64 = config.radius.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("radius must be a number, got '{}'", config.radius))
    })?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(ConfigError::Validation(format!(
            "radius must be >= 0, got {}",
            config.radius
        )));
    }

    for (field, value) in [
        ("search_location", &config.search_location),
        ("location_identifier", &config.location_identifier),
    ] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot be empty when set",
                field
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_results < 1 {
        return Err(ConfigError::Validation(format!(
            "max_results must be >= 1, got {}",
            config.max_results
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_concurrency < 1 || config.max_concurrency > MAX_CONCURRENCY_CEILING {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY_CEILING, config.max_concurrency
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

/// Validates identity rotation settings
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one entry".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty strings".to_string(),
        ));
    }

    for proxy in &config.proxies {
        validate_http_url(proxy, "proxy")?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn valid_config() -> Config {
        Config {
            search: SearchConfig::default(),
            crawler: CrawlerConfig::default(),
            identity: IdentityConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Jsonl,
                dataset_path: "./agents.jsonl".to_string(),
                summary_path: "./summary.json".to_string(),
            },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = valid_config();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.batch_size = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.max_concurrency = 21;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_radius() {
        let mut config = valid_config();
        config.search.radius = "far".to_string();
        assert!(validate(&config).is_err());

        config.search.radius = "-1.0".to_string();
        assert!(validate(&config).is_err());

        config.search.radius = "5.0".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_start_url() {
        let mut config = valid_config();
        config.search.start_url = Some("ftp://example.com/agents".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.search.start_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_empty_identity() {
        let mut config = valid_config();
        config.identity.user_agents.clear();
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.identity.proxies = vec!["socks://nope".to_string()];
        assert!(validate(&config).is_err());
    }
}
