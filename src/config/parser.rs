use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Values supplied through the process environment or command line
///
/// These take precedence over anything in the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Solver endpoint (`SOLVER_URL`)
    pub solver_url: Option<String>,

    /// Object-storage bucket URL (`S3_BUCKET_URL`)
    pub bucket_url: Option<String>,

    /// Number of concurrent fetches
    pub concurrency: Option<u32>,
}

impl ConfigOverrides {
    /// Applies the overrides on top of a parsed configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = non_empty(&self.solver_url) {
            config.solver.endpoint = Some(url);
        }
        if let Some(url) = non_empty(&self.bucket_url) {
            config.output.bucket_url = Some(url);
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses a TOML configuration string without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads a configuration, applies overrides and validates the result
///
/// When `path` is `None` the built-in defaults are used, so a run can be
/// configured purely through the environment.
///
/// # Arguments
///
/// * `path` - Optional path to the TOML configuration file
/// * `overrides` - Environment/CLI values applied after parsing
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rental_harvest::config::{load_config, ConfigOverrides};
///
/// let overrides = ConfigOverrides {
///     solver_url: Some("http://localhost:8191/v1".to_string()),
///     ..Default::default()
/// };
/// let config = load_config(Some(Path::new("harvest.toml")), &overrides).unwrap();
/// println!("Concurrency: {}", config.crawler.concurrency);
/// ```
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            parse_config(&content)?
        }
        None => Config::default(),
    };

    overrides.apply(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so output files can be tied back to the settings that
/// produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<(Config, String), ConfigError> {
    let config = load_config(Some(path), overrides)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
