//! Crawl driver: page enumeration and the fixed-size worker pool
//!
//! Each crawl fills a bounded FIFO `WorkQueue` with page URLs and starts
//! `concurrency` workers in a `JoinSet`. A worker pops a URL, fetches it
//! through the `PageSource`, runs extraction inline and keeps the records in
//! its own buffer. Buffers are merged once every worker has finished, so there
//! is no shared result list and output order is unspecified.
//!
//! A page that fails to fetch or extract is logged and skipped. It never
//! aborts the crawl or touches records from other pages.

use crate::config::Config;
use crate::crawler::queue::{QueueError, WorkQueue};
use crate::extract::{Extractor, Listing, Property};
use crate::solver::PageSource;
use crate::{ConfigError, ExtractError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Settings of one crawl driver
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// First search-results page of the listing crawl
    pub listing_search_url: String,

    /// First search-results page of link discovery
    pub property_search_url: String,

    /// Page-load budget handed to the page source per fetch
    pub page_timeout: Duration,

    /// Maximum number of queued pages per crawl
    pub queue_capacity: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            listing_search_url: config.target.listing_search_url.clone(),
            property_search_url: config.target.property_search_url.clone(),
            page_timeout: Duration::from_millis(config.solver.max_timeout_ms),
            queue_capacity: config.crawler.queue_capacity,
        }
    }
}

/// Outcome counters of one worker
#[derive(Debug)]
struct WorkerReport<R> {
    records: Vec<R>,
    pages_ok: usize,
    pages_failed: usize,
}

/// Drives fetch and extraction over a set of pages
pub struct CrawlDriver {
    source: Arc<dyn PageSource>,
    extractor: Arc<Extractor>,
    settings: CrawlSettings,
}

impl CrawlDriver {
    pub fn new(source: Arc<dyn PageSource>, extractor: Arc<Extractor>, settings: CrawlSettings) -> Self {
        Self {
            source,
            extractor,
            settings,
        }
    }

    /// Builds a driver with the extractor and settings described by `config`
    pub fn from_config(source: Arc<dyn PageSource>, config: &Config) -> Result<Self, ConfigError> {
        let extractor = Extractor::new(&config.selectors, &config.target.site_url)?;
        Ok(Self::new(
            source,
            Arc::new(extractor),
            CrawlSettings::from_config(config),
        ))
    }

    /// Collects property links from search pages `[min_page, max_page)`
    ///
    /// Pages are fetched one at a time and links are returned in page order,
    /// which keeps the link file stable for resuming the detail crawl.
    pub async fn run_link_discovery(&self, min_page: u32, max_page: u32) -> Vec<String> {
        tracing::info!("Discovering property links from page {} to page {}", min_page, max_page);

        let mut links = Vec::new();
        for page in min_page..max_page {
            let url = search_page_url(&self.settings.property_search_url, page);

            let fetched = match self.source.fetch_page(&url, self.settings.page_timeout).await {
                Ok(fetched) if fetched.status_ok => fetched,
                Ok(_) => {
                    tracing::warn!("Skipping search page {}: upstream returned an error page", url);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Could not fetch search page {}: {}", url, e);
                    continue;
                }
            };

            match self.extractor.property_links(&fetched.raw_html) {
                Ok(found) => {
                    tracing::debug!("Found {} property links on {}", found.len(), url);
                    links.extend(found);
                }
                Err(e) => tracing::warn!("Could not parse search page {}: {}", url, e),
            }
        }

        tracing::info!("Total property links discovered: {}", links.len());
        links
    }

    /// Fetches and extracts one property per detail link
    ///
    /// Blank and duplicate links are dropped before queueing.
    pub async fn run_detail_crawl(
        &self,
        links: Vec<String>,
        concurrency: usize,
    ) -> Result<Vec<Property>, QueueError> {
        let mut seen = HashSet::new();
        let links: Vec<String> = links
            .into_iter()
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty() && seen.insert(link.clone()))
            .collect();

        let properties = self
            .run_pool(links, concurrency, |extractor, html, url| {
                extractor.property(html, url).map(|property| vec![property])
            })
            .await?;

        tracing::info!("Total properties scraped: {}", properties.len());
        Ok(properties)
    }

    /// Fetches search pages `1..=page_count` and extracts their listings
    pub async fn run_listing_crawl(
        &self,
        page_count: u32,
        concurrency: usize,
    ) -> Result<Vec<Listing>, QueueError> {
        self.run_listing_range(1, page_count.saturating_add(1), concurrency)
            .await
    }

    /// Fetches search pages `[min_page, max_page)` and extracts their listings
    pub async fn run_listing_range(
        &self,
        min_page: u32,
        max_page: u32,
        concurrency: usize,
    ) -> Result<Vec<Listing>, QueueError> {
        tracing::info!("Scraping listings from page {} to page {}", min_page, max_page);

        let urls = (min_page..max_page)
            .map(|page| search_page_url(&self.settings.listing_search_url, page))
            .collect();

        let listings = self
            .run_pool(urls, concurrency, |extractor, html, _url| extractor.listings(html))
            .await?;

        tracing::info!("Total listings scraped: {}", listings.len());
        Ok(listings)
    }

    /// Runs `concurrency` workers over `urls` and merges their buffers
    async fn run_pool<R, F>(
        &self,
        urls: Vec<String>,
        concurrency: usize,
        extract: F,
    ) -> Result<Vec<R>, QueueError>
    where
        R: Send + 'static,
        F: Fn(&Extractor, &str, &str) -> Result<Vec<R>, ExtractError> + Send + Sync + 'static,
    {
        let total = urls.len();
        let queue = Arc::new(WorkQueue::with_jobs(urls, self.settings.queue_capacity)?);
        let extract = Arc::new(extract);
        let workers_count = concurrency.max(1).min(total.max(1));
        let start_time = Instant::now();

        let mut workers = JoinSet::new();
        for worker_id in 0..workers_count {
            let queue = Arc::clone(&queue);
            let source = Arc::clone(&self.source);
            let extractor = Arc::clone(&self.extractor);
            let extract = Arc::clone(&extract);
            let timeout = self.settings.page_timeout;

            workers.spawn(async move {
                let mut report = WorkerReport {
                    records: Vec::new(),
                    pages_ok: 0,
                    pages_failed: 0,
                };

                while let Some(url) = queue.pop() {
                    let fetched = match source.fetch_page(&url, timeout).await {
                        Ok(fetched) => fetched,
                        Err(e) => {
                            if e.is_fatal() {
                                tracing::error!("Worker {}: could not fetch {}: {}", worker_id, url, e);
                            } else {
                                tracing::warn!("Worker {}: could not fetch {}: {}", worker_id, url, e);
                            }
                            report.pages_failed += 1;
                            continue;
                        }
                    };

                    if !fetched.status_ok {
                        tracing::warn!("Worker {}: skipping {}: upstream returned an error page", worker_id, url);
                        report.pages_failed += 1;
                        continue;
                    }

                    match extract(&extractor, &fetched.raw_html, &url) {
                        Ok(records) => {
                            tracing::debug!("Worker {}: {} records from {}", worker_id, records.len(), url);
                            report.records.extend(records);
                            report.pages_ok += 1;
                        }
                        Err(e) => {
                            tracing::warn!("Worker {}: could not parse {}: {}", worker_id, url, e);
                            report.pages_failed += 1;
                        }
                    }
                }

                report
            });
        }

        let mut records = Vec::new();
        let mut pages_ok = 0;
        let mut pages_failed = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    records.extend(report.records);
                    pages_ok += report.pages_ok;
                    pages_failed += report.pages_failed;
                }
                Err(e) => tracing::error!("Crawl worker stopped abnormally: {}", e),
            }
        }

        tracing::info!(
            "Crawled {} pages ({} ok, {} failed) with {} workers in {:?}",
            total,
            pages_ok,
            pages_failed,
            workers_count,
            start_time.elapsed()
        );

        Ok(records)
    }
}

/// URL of search-results page `page`
///
/// Page 1 (and 0) is the bare search URL; later pages append `/<page>`.
pub fn search_page_url(search_url: &str, page: u32) -> String {
    if page <= 1 {
        search_url.to_string()
    } else {
        format!("{}/{}", search_url.trim_end_matches('/'), page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SelectorConfig;
    use crate::solver::FetchResult;
    use crate::{SolverError, SolverResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SEARCH: &str = "https://www.example.com/search";

    /// In-memory page source with optional failures and in-flight tracking
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, String>,
        timeouts: HashSet<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }

        fn with_timeout(mut self, url: &str) -> Self {
            self.timeouts.insert(url.to_string());
            self
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, url: &str, _timeout: Duration) -> SolverResult<FetchResult> {
            self.requested.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.timeouts.contains(url) {
                return Err(SolverError::FetchTimeout {
                    url: url.to_string(),
                });
            }

            match self.pages.get(url) {
                Some(html) => Ok(FetchResult {
                    raw_html: html.clone(),
                    status_ok: true,
                }),
                None => Err(SolverError::FetchFailed {
                    url: url.to_string(),
                    message: "not found".to_string(),
                }),
            }
        }
    }

    fn settings() -> CrawlSettings {
        CrawlSettings {
            listing_search_url: SEARCH.to_string(),
            property_search_url: SEARCH.to_string(),
            page_timeout: Duration::from_secs(1),
            queue_capacity: 100,
        }
    }

    fn driver(source: Arc<FakeSource>) -> CrawlDriver {
        let extractor = Extractor::new(&SelectorConfig::default(), "https://www.example.com").unwrap();
        CrawlDriver::new(source, Arc::new(extractor), settings())
    }

    fn detail_page(name: &str) -> String {
        format!(
            r#"<html><body><div id="wrapper"><div class="listing-details-primary"><table><tbody>
               <tr class="property-attr"><td class="label-block"><h4 class="label-block">Project Name</h4></td>
               <td class="value-block">{}</td></tr></tbody></table></div></div></body></html>"#,
            name
        )
    }

    fn listing_page(ids: &[u32]) -> String {
        let cards: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="listing-card"><div class="header-wrapper"><div class="header-container">
                       <a class="nav-link" href="/listing/{}" title="Unit {}">Unit</a></div></div></div>"#,
                    id, id
                )
            })
            .collect();
        format!(r#"<html><body><div id="listings-container">{}</div></body></html>"#, cards)
    }

    fn search_page(paths: &[&str]) -> String {
        let items: String = paths
            .iter()
            .map(|p| format!(r#"<div class="header-container"><h3><a class="nav-link" href="{}">x</a></h3></div>"#, p))
            .collect();
        format!(r#"<html><body><div class="main-content">{}</div></body></html>"#, items)
    }

    fn link(i: u32) -> String {
        format!("https://www.example.com/project/{}", i)
    }

    #[test]
    fn test_search_page_url() {
        assert_eq!(search_page_url(SEARCH, 1), SEARCH);
        assert_eq!(search_page_url(SEARCH, 0), SEARCH);
        assert_eq!(search_page_url(SEARCH, 3), format!("{}/3", SEARCH));
        assert_eq!(search_page_url("https://www.example.com/search/", 2), format!("{}/2", SEARCH));
    }

    #[tokio::test]
    async fn test_detail_crawl_skips_timed_out_link() {
        let source = FakeSource::default()
            .with_page(&link(1), detail_page("One"))
            .with_page(&link(2), detail_page("Two"))
            .with_page(&link(3), detail_page("Three"))
            .with_timeout(&link(2));
        let driver = driver(Arc::new(source));

        let properties = driver
            .run_detail_crawl(vec![link(1), link(2), link(3)], 2)
            .await
            .unwrap();

        assert_eq!(properties.len(), 2);
        let mut names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["One", "Three"]);
    }

    #[tokio::test]
    async fn test_detail_crawl_concurrency_bound_and_membership() {
        let mut source = FakeSource::default();
        for i in 1..=5 {
            source = source.with_page(&link(i), detail_page(&format!("P{}", i)));
        }
        let source = Arc::new(source);
        let driver = driver(Arc::clone(&source));

        let properties = driver
            .run_detail_crawl((1..=5).map(link).collect(), 2)
            .await
            .unwrap();

        assert_eq!(properties.len(), 5);
        let unique: HashSet<_> = properties.iter().map(|p| p.link.clone()).collect();
        assert_eq!(unique.len(), 5);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(source.requested.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_detail_crawl_skips_unparsable_page() {
        let source = FakeSource::default()
            .with_page(&link(1), detail_page("One"))
            .with_page(&link(2), "<html><body>Just a moment...</body></html>".to_string());
        let driver = driver(Arc::new(source));

        let properties = driver
            .run_detail_crawl(vec![link(1), link(2)], 2)
            .await
            .unwrap();

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].link, link(1));
    }

    #[tokio::test]
    async fn test_detail_crawl_drops_blank_and_duplicate_links() {
        let source = Arc::new(FakeSource::default().with_page(&link(1), detail_page("One")));
        let driver = driver(Arc::clone(&source));

        let properties = driver
            .run_detail_crawl(vec![link(1), String::new(), format!(" {} ", link(1))], 2)
            .await
            .unwrap();

        assert_eq!(properties.len(), 1);
        assert_eq!(source.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detail_crawl_queue_overflow() {
        let source = Arc::new(FakeSource::default());
        let extractor = Extractor::new(&SelectorConfig::default(), "https://www.example.com").unwrap();
        let driver = CrawlDriver::new(
            source,
            Arc::new(extractor),
            CrawlSettings {
                queue_capacity: 2,
                ..settings()
            },
        );

        let result = driver.run_detail_crawl((1..=3).map(link).collect(), 2).await;
        assert!(matches!(result, Err(QueueError::QueueFull { capacity: 2 })));
    }

    #[tokio::test]
    async fn test_listing_crawl_collects_all_cards() {
        let source = FakeSource::default()
            .with_page(SEARCH, listing_page(&[1, 2, 3]))
            .with_page(&format!("{}/2", SEARCH), listing_page(&[4, 5]))
            .with_timeout(&format!("{}/3", SEARCH));
        let driver = driver(Arc::new(source));

        let listings = driver.run_listing_crawl(3, 2).await.unwrap();

        assert_eq!(listings.len(), 5);
        assert!(listings.iter().all(|l| l.link.starts_with("https://www.example.com/listing/")));
    }

    #[tokio::test]
    async fn test_link_discovery_keeps_page_order() {
        let source = FakeSource::default()
            .with_page(&format!("{}/2", SEARCH), search_page(&["/project/a", "/project/b"]))
            .with_page(&format!("{}/3", SEARCH), search_page(&["/project/c"]))
            .with_page(&format!("{}/5", SEARCH), search_page(&["/project/d"]));
        let source = Arc::new(source);
        let driver = driver(Arc::clone(&source));

        let links = driver.run_link_discovery(2, 6).await;

        assert_eq!(
            links,
            vec![
                "https://www.example.com/project/a",
                "https://www.example.com/project/b",
                "https://www.example.com/project/c",
                "https://www.example.com/project/d",
            ]
        );
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(source.requested.lock().unwrap().len(), 4);
    }
}
