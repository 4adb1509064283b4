//! Output sink writing into a local directory

use crate::output::traits::{OutputResult, OutputSink};
use async_trait::async_trait;
use std::path::PathBuf;

/// Writes documents as files under a directory
#[derive(Debug, Clone)]
pub struct LocalSink {
    directory: PathBuf,
}

impl LocalSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

#[async_trait]
impl OutputSink for LocalSink {
    async fn write(&self, name: &str, bytes: &[u8]) -> OutputResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(self.path_for(name), bytes).await?;
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        self.path_for(name).display().to_string()
    }
}
