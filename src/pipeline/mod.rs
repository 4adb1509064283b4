//! Pipeline orchestration for the three crawl runs
//!
//! Every run follows the same shape: open a solver session, crawl, release
//! the session, persist what was collected. The session is released whether
//! or not the crawl succeeded. Pages that fail inside a crawl only shrink the
//! result; whatever was collected is still written out.

use crate::config::Config;
use crate::crawler::CrawlDriver;
use crate::extract::{Listing, Property};
use crate::output::{read_links, sink_from_config, write_links, write_records, LocalSink};
use crate::solver::{with_session, PageSource};
use crate::{HarvestError, Result};
use std::path::Path;
use std::sync::Arc;

/// File name of the listing output document
pub const LISTINGS_FILE: &str = "listings.json";

/// File name of a property output document created at `unix_nanos`
pub fn properties_file_name(unix_nanos: i64) -> String {
    format!("properties-{}.json", unix_nanos)
}

/// Discovers property links on search pages `[min_page, max_page)` and writes
/// them to the configured link file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The discovered links, in page order
/// * `Err(HarvestError)` - The session could not be opened or the file written
pub async fn discover_links(config: &Config, min_page: u32, max_page: u32) -> Result<Vec<String>> {
    let links = with_session(&config.solver, |client| async move {
        let driver = CrawlDriver::from_config(client as Arc<dyn PageSource>, config)?;
        Ok::<_, HarvestError>(driver.run_link_discovery(min_page, max_page).await)
    })
    .await?;

    write_links(Path::new(&config.output.links_file), &links).await?;
    Ok(links)
}

/// Scrapes one property per link and writes `properties-<unix-nanos>.json`
///
/// When a bucket is configured the document goes to the bucket and a copy is
/// also kept in `output.directory`.
///
/// # Returns
///
/// * `Ok(Vec<Property>)` - The scraped properties, in no particular order
/// * `Err(HarvestError)` - Startup, session or output failure
pub async fn scrape_properties(config: &Config, links: Vec<String>) -> Result<Vec<Property>> {
    let sink = sink_from_config(config)?;
    let concurrency = config.crawler.concurrency as usize;

    let properties = with_session(&config.solver, |client| async move {
        let driver = CrawlDriver::from_config(client as Arc<dyn PageSource>, config)?;
        Ok::<_, HarvestError>(driver.run_detail_crawl(links, concurrency).await?)
    })
    .await?;

    let unix_nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let file_name = properties_file_name(unix_nanos);
    write_records(sink.as_ref(), &file_name, &properties).await?;

    if config.output.bucket_url.is_some() {
        let local = LocalSink::new(&config.output.directory);
        write_records(&local, &file_name, &properties).await?;
    }

    Ok(properties)
}

/// Reads the configured link file and scrapes its properties
pub async fn scrape_properties_from_file(config: &Config) -> Result<Vec<Property>> {
    let path = Path::new(&config.output.links_file);
    let links = read_links(path).await?;
    tracing::info!("Read {} property links from {}", links.len(), path.display());

    scrape_properties(config, links).await
}

/// Scrapes search pages `1..=page_count` and writes `listings.json`
pub async fn scrape_listings(config: &Config, page_count: u32) -> Result<Vec<Listing>> {
    let sink = sink_from_config(config)?;
    let concurrency = config.crawler.concurrency as usize;

    let listings = with_session(&config.solver, |client| async move {
        let driver = CrawlDriver::from_config(client as Arc<dyn PageSource>, config)?;
        Ok::<_, HarvestError>(driver.run_listing_crawl(page_count, concurrency).await?)
    })
    .await?;

    write_records(sink.as_ref(), LISTINGS_FILE, &listings).await?;
    Ok(listings)
}
