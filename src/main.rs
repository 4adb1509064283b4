//! Rental-Harvest main entry point
//!
//! This is the command-line interface for the Rental-Harvest crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rental_harvest::config::{load_config, load_config_with_hash, Config, ConfigOverrides};
use rental_harvest::pipeline;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rental-Harvest: a solver-proxied real-estate crawler
///
/// Rental-Harvest fetches listing and property pages through a remote
/// browser-automation solver, extracts structured records from them and
/// writes the records as JSON to a local directory or a bucket.
#[derive(Parser, Debug)]
#[command(name = "rental-harvest")]
#[command(version)]
#[command(about = "A solver-proxied real-estate crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Solver service endpoint
    #[arg(long, env = "SOLVER_URL", global = true, hide_env_values = true)]
    solver_url: Option<String>,

    /// Output bucket URL (file://... or http(s)://...)
    #[arg(long, env = "S3_BUCKET_URL", global = true, hide_env_values = true)]
    bucket_url: Option<String>,

    /// Number of concurrent crawl workers
    #[arg(long, global = true)]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover property links on search pages [MIN, MAX)
    Links {
        /// First search page (inclusive)
        min: u32,

        /// Last search page (exclusive)
        max: u32,

        /// Link file to write
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Scrape property detail pages listed in the link file
    Properties {
        /// Link file to read
        #[arg(long, value_name = "FILE")]
        links: Option<PathBuf>,
    },

    /// Scrape rental listings from the search-results pages
    Listings {
        /// Number of search pages to scrape (defaults to crawler.listing-pages)
        #[arg(long)]
        pages: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from .env feed the env-backed flags below
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load(&cli)?;

    match cli.command {
        Command::Links { min, max, out } => {
            if let Some(out) = out {
                config.output.links_file = out.display().to_string();
            }
            handle_links(&config, min, max).await
        }
        Command::Properties { links } => {
            if let Some(links) = links {
                config.output.links_file = links.display().to_string();
            }
            handle_properties(&config).await
        }
        Command::Listings { pages } => {
            let pages = pages.unwrap_or(config.crawler.listing_pages);
            handle_listings(&config, pages).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rental_harvest=info,warn"),
            1 => EnvFilter::new("rental_harvest=debug,info"),
            2 => EnvFilter::new("rental_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads, overrides and validates the configuration
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let overrides = ConfigOverrides {
        solver_url: cli.solver_url.clone(),
        bucket_url: cli.bucket_url.clone(),
        concurrency: cli.concurrency,
    };

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path, &overrides)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            load_config(None, &overrides).context("Invalid configuration")?
        }
    };

    tracing::info!(
        "Solver: {}, workers: {}",
        config.solver.endpoint.as_deref().unwrap_or_default(),
        config.crawler.concurrency
    );

    Ok(config)
}

async fn handle_links(config: &Config, min: u32, max: u32) -> anyhow::Result<()> {
    let links = pipeline::discover_links(config, min, max)
        .await
        .context("Link discovery failed")?;

    tracing::info!(
        "Link discovery completed: {} links written to {}",
        links.len(),
        config.output.links_file
    );
    Ok(())
}

async fn handle_properties(config: &Config) -> anyhow::Result<()> {
    let properties = pipeline::scrape_properties_from_file(config)
        .await
        .context("Property crawl failed")?;

    tracing::info!("Property crawl completed: {} properties", properties.len());
    Ok(())
}

async fn handle_listings(config: &Config, pages: u32) -> anyhow::Result<()> {
    let listings = pipeline::scrape_listings(config, pages)
        .await
        .context("Listing crawl failed")?;

    tracing::info!("Listing crawl completed: {} listings", listings.len());
    Ok(())
}
