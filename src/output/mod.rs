//! Output module for persisting crawl results
//!
//! This module handles:
//! - Serializing records as pretty-printed JSON arrays
//! - Writing documents to a local directory or an object-storage bucket
//! - Reading and writing the property link file

mod bucket;
mod links;
mod local;
mod traits;

pub use bucket::{sink_from_config, BucketSink};
pub use links::{read_links, write_links};
pub use local::LocalSink;
pub use traits::{to_json_pretty, write_records, OutputError, OutputResult, OutputSink};
