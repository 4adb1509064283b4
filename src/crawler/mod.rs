//! Crawler module for queued page fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - A bounded FIFO work queue
//! - A fixed-size worker pool fetching through the solver
//! - Sequential link discovery and concurrent detail/listing crawls

mod driver;
mod queue;

pub use driver::{search_page_url, CrawlDriver, CrawlSettings};
pub use queue::{QueueError, WorkQueue};
