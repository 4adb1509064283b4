//! Output sink trait and errors
//!
//! A sink receives a finished document under a file name and persists it
//! somewhere: a local directory or a remote bucket.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to upload {name}: {message}")]
    Upload { name: String, message: String },

    #[error("Invalid bucket URL '{0}'")]
    InvalidBucketUrl(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for named output documents
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Persists `bytes` under `name`, replacing any previous document
    async fn write(&self, name: &str, bytes: &[u8]) -> OutputResult<()>;

    /// Human-readable location of `name`, used in log lines
    fn location(&self, name: &str) -> String;
}

/// Serializes records as a pretty-printed JSON array
pub fn to_json_pretty<T: Serialize>(records: &[T]) -> OutputResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Serializes `records` and writes them to `sink` as `name`
pub async fn write_records<T: Serialize>(
    sink: &dyn OutputSink,
    name: &str,
    records: &[T],
) -> OutputResult<()> {
    let bytes = to_json_pretty(records)?;
    sink.write(name, &bytes).await?;
    tracing::info!("Wrote {} records to {}", records.len(), sink.location(name));
    Ok(())
}
