use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use crate::config::Config;
use crate::PipelineError;

const SUBTITLE_CONTENT_TYPE: &str = "application/x-subrip; charset=utf-8";

/// Object storage able to hand out time-limited download links
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key`
    async fn put(&self, key: &str, body: String) -> Result<(), PipelineError>;

    /// Presigned GET URL for `key`
    async fn signed_url(&self, key: &str) -> Result<String, PipelineError>;
}

/// S3 bucket holding translated subtitles
pub struct S3Store {
    client: S3Client,
    bucket: String,
    url_expiry: Duration,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>, url_expiry: Duration) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            url_expiry,
        }
    }

    /// Build the store from configuration, loading credentials from the AWS provider chain
    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(config.aws_region())
            .load()
            .await;

        Self::new(
            S3Client::new(&aws_config),
            config.aws.s3_bucket.clone(),
            Duration::from_secs(config.aws.url_expiry_secs),
        )
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, body: String) -> Result<(), PipelineError> {
        tracing::info!("Uploading subtitle to S3: s3://{}/{}", self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body.into_bytes().into())
            .content_type(SUBTITLE_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| PipelineError::StorageFailure(format!("put_object {}: {}", key, e)))?;

        Ok(())
    }

    async fn signed_url(&self, key: &str) -> Result<String, PipelineError> {
        let presigning = PresigningConfig::expires_in(self.url_expiry)
            .map_err(|e| PipelineError::StorageFailure(format!("Invalid URL expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| PipelineError::StorageFailure(format!("presign {}: {}", key, e)))?;

        Ok(request.uri().to_string())
    }
}

/// Store a translated subtitle and return a presigned link to it
pub async fn upload_subtitle(
    store: &dyn ObjectStore,
    key: &str,
    content: String,
) -> Result<String, PipelineError> {
    let result = async {
        store.put(key, content).await?;
        store.signed_url(key).await
    }
    .await;

    match &result {
        Ok(_) => tracing::info!("File uploaded successfully: {}", key),
        Err(e) => tracing::error!("File not uploaded: {}", e),
    }

    result
}
