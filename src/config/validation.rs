use crate::config::types::{Config, CrawlerConfig, OutputConfig, SolverConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_solver_config(&config.solver)?;
    validate_crawler_config(&config.crawler)?;
    validate_target_config(&config.target)?;
    validate_output_config(&config.output)?;
    config.selectors.compile()?;
    Ok(())
}

/// Validates solver configuration
///
/// The HTTP timeout must cover the solver's own page-load budget, which makes
/// the HTTP timeout the effective upper bound of a single fetch.
fn validate_solver_config(config: &SolverConfig) -> Result<(), ConfigError> {
    let endpoint = config
        .endpoint
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or(ConfigError::MissingSolverEndpoint)?;

    validate_http_url(endpoint, "solver endpoint")?;

    if config.max_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "max_timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.http_timeout_secs.saturating_mul(1000) < config.max_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "http_timeout_secs ({}s) must be >= max_timeout_ms ({}ms)",
            config.http_timeout_secs, config.max_timeout_ms
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates target site URLs
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.site_url, "site_url")?;
    validate_http_url(&config.listing_search_url, "listing_search_url")?;
    validate_http_url(&config.property_search_url, "property_search_url")?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.links_file.is_empty() {
        return Err(ConfigError::Validation(
            "links_file cannot be empty".to_string(),
        ));
    }

    if let Some(bucket) = &config.bucket_url {
        let url = Url::parse(bucket)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid bucket URL '{}': {}", bucket, e)))?;

        if !matches!(url.scheme(), "file" | "s3" | "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Bucket URL '{}' must use file, s3, http or https scheme",
                bucket
            )));
        }
    }

    Ok(())
}

fn validate_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS scheme",
            field, value
        )));
    }

    Ok(())
}
