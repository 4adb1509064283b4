//! Configuration module for Rental-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! with environment overrides for the solver endpoint and bucket URL.
//!
//! # Example
//!
//! ```no_run
//! use rental_harvest::config::{load_config, ConfigOverrides};
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("harvest.toml")), &ConfigOverrides::default()).unwrap();
//! println!("Crawler will use {} workers", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SolverConfig, TargetConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, ConfigOverrides,
};
pub use validation::validate;
