//! Bucket output backed by an object store
//!
//! A bucket URL is one of:
//! - `file://<dir>`, served by a [`LocalSink`]
//! - `s3://<bucket>[/<prefix>][?region=..]`, an S3 bucket; credentials come
//!   from the usual `AWS_*` environment variables
//! - `http(s)://<host>[/<prefix>]`, a WebDAV-style store accepting `PUT`

use crate::config::Config;
use crate::output::local::LocalSink;
use crate::output::traits::{OutputError, OutputResult, OutputSink};
use async_trait::async_trait;
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::http::HttpBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore, PutPayload};
use std::time::Duration;
use url::{Position, Url};

/// Writes documents as objects under a bucket prefix
#[derive(Debug)]
pub struct BucketSink {
    store: Box<dyn ObjectStore>,
    prefix: ObjectPath,
    display_url: String,
}

impl BucketSink {
    /// Opens the bucket at `bucket_url`
    ///
    /// Query parameters of an `s3://` URL (e.g. `region`) are applied as
    /// store options. No network traffic happens until the first write.
    ///
    /// # Errors
    ///
    /// * `OutputError::InvalidBucketUrl` - unsupported scheme, or the store
    ///   could not be configured from the URL
    pub fn new(bucket_url: &str, timeout: Duration) -> OutputResult<Self> {
        let invalid = || OutputError::InvalidBucketUrl(bucket_url.to_string());

        let parsed = Url::parse(bucket_url).map_err(|_| invalid())?;
        let client_options = ClientOptions::new()
            .with_timeout(timeout)
            .with_allow_http(parsed.scheme() == "http")
            .with_default_content_type("application/json");

        let store: Box<dyn ObjectStore> = match parsed.scheme() {
            "s3" => {
                let bucket = parsed.host_str().ok_or_else(invalid)?;
                let builder = parsed.query_pairs().fold(
                    AmazonS3Builder::from_env()
                        .with_bucket_name(bucket)
                        .with_client_options(client_options),
                    |builder, (key, value)| match key.parse::<AmazonS3ConfigKey>() {
                        Ok(key) => builder.with_config(key, value.into_owned()),
                        Err(_) => {
                            tracing::warn!("Ignoring unknown bucket option '{}'", key);
                            builder
                        }
                    },
                );
                Box::new(builder.build().map_err(|_| invalid())?)
            }
            "http" | "https" => Box::new(
                HttpBuilder::new()
                    .with_url(&parsed[..Position::BeforePath])
                    .with_client_options(client_options)
                    .build()
                    .map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };

        let mut display_url = parsed.clone();
        display_url.set_query(None);

        Ok(Self {
            store,
            prefix: ObjectPath::from(parsed.path().trim_matches('/')),
            display_url: display_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, name: &str) -> ObjectPath {
        self.prefix.child(name)
    }
}

#[async_trait]
impl OutputSink for BucketSink {
    async fn write(&self, name: &str, bytes: &[u8]) -> OutputResult<()> {
        self.store
            .put(&self.object_path(name), PutPayload::from(bytes.to_vec()))
            .await
            .map_err(|e| OutputError::Upload {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        format!("{}/{}", self.display_url, name)
    }
}

/// Picks the sink described by the output configuration
///
/// Without a bucket URL, documents go to `output.directory`.
pub fn sink_from_config(config: &Config) -> OutputResult<Box<dyn OutputSink>> {
    let Some(bucket_url) = config.output.bucket_url.as_deref() else {
        return Ok(Box::new(LocalSink::new(&config.output.directory)));
    };

    let parsed = Url::parse(bucket_url)
        .map_err(|_| OutputError::InvalidBucketUrl(bucket_url.to_string()))?;

    if parsed.scheme() == "file" {
        let directory = parsed
            .to_file_path()
            .map_err(|_| OutputError::InvalidBucketUrl(bucket_url.to_string()))?;
        return Ok(Box::new(LocalSink::new(directory)));
    }

    Ok(Box::new(BucketSink::new(
        bucket_url,
        Duration::from_secs(config.solver.http_timeout_secs),
    )?))
}
