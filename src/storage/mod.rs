use std::future::Future;

use anyhow::{Context, Result};
use aws_sdk_s3::{config::Region, primitives::ByteStream};

use crate::config::StorageConfig;

/// Destination for uploaded listing assets.
pub trait ObjectStore {
    /// Stores `content` under `key`.
    fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Publicly reachable URL for a stored key.
    fn public_url(&self, key: &str) -> String;
}

#[derive(Clone, Debug)]
pub struct S3Storage {
    inner: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    pub fn new(inner: aws_sdk_s3::Client, config: &StorageConfig) -> Self {
        Self {
            inner,
            bucket: config.bucket.clone(),
            public_base: config.public_base(),
        }
    }

    /// Loads credentials from the default AWS provider chain.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(aws_sdk_s3::Client::from_conf(builder.build()), config)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3Storage {
    #[tracing::instrument(skip(self, content), fields(bucket = %self.bucket, size = content.len()))]
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<()> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .with_context(|| format!("could not put {key} into bucket {}", self.bucket))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}
