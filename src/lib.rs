//! Rental-Harvest: a solver-proxied real-estate crawler
//!
//! This crate fetches search-results and detail pages of a listing website through
//! a remote browser-automation "solver" session, extracts listings and properties
//! from the returned HTML, and persists them as JSON.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod solver;

use thiserror::Error;

/// Main error type for Rental-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Queue error: {0}")]
    Queue(#[from] crawler::QueueError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Solver endpoint is missing (set SOLVER_URL or solver.endpoint)")]
    MissingSolverEndpoint,
}

/// Errors raised while talking to the solver service
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Solver unreachable at {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Solver protocol error: {0}")]
    Protocol(String),

    #[error("Fetch timed out for {url}")]
    FetchTimeout { url: String },

    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Solver session is closed")]
    SessionClosed,
}

impl SolverError {
    /// Returns true if the error prevents any further fetch in this run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Protocol(_) | Self::SessionClosed
        )
    }
}

/// Page-level extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Page has no {page} container")]
    MissingContainer { page: &'static str },
}

/// Result type alias for Rental-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for solver operations
pub type SolverResult<T> = std::result::Result<T, SolverError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{Amenities, Coordinate, Listing, Property};
pub use solver::{FetchResult, PageSource, SolverClient};
