use crate::extract::SelectorConfig;
use serde::Deserialize;

/// Main configuration structure for Rental-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
    pub crawler: CrawlerConfig,
    pub target: TargetConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

/// Solver service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SolverConfig {
    /// Solver HTTP endpoint (e.g. `http://localhost:8191/v1`)
    pub endpoint: Option<String>,

    /// Time budget handed to the solver for a single page load (milliseconds)
    pub max_timeout_ms: u64,

    /// Whole-request timeout of the HTTP client talking to the solver (seconds)
    pub http_timeout_secs: u64,

    /// Connection timeout when dialing the solver (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_timeout_ms: 60_000,
            http_timeout_secs: 180,
            connect_timeout_secs: 30,
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent page fetches
    pub concurrency: u32,

    /// Maximum number of jobs the work queue accepts
    pub queue_capacity: usize,

    /// Number of search-results pages walked by the listing crawl
    pub listing_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            queue_capacity: 10_000,
            listing_pages: 9,
        }
    }
}

/// Target website configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Site root used to resolve relative links
    pub site_url: String,

    /// First search-results page of the rental listings
    pub listing_search_url: String,

    /// First search-results page used for property link discovery
    pub property_search_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.propertyguru.com.my".to_string(),
            listing_search_url: "https://www.propertyguru.com.my/apartment-condo-service-residence-for-rent/in-kuala-lumpur-58jok".to_string(),
            property_search_url: "https://www.propertyguru.com.my/condo-directory/search/in-kuala-lumpur-58jok".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Local directory for JSON output when no bucket is configured
    pub directory: String,

    /// Object-storage bucket URL (`file://...` or `http(s)://...`)
    pub bucket_url: Option<String>,

    /// Line-delimited property link file
    pub links_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            bucket_url: None,
            links_file: "property-links.txt".to_string(),
        }
    }
}
