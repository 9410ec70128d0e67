use crate::config::S3Config;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Content type of every object written by the processor
pub const OUTPUT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Errors returned by a content store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object {key} not found in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    #[error("access denied to {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    #[error("failed to read object body: {0}")]
    Body(String),

    #[error("content store request failed: {0}")]
    Request(String),
}

/// Object storage the processor reads from and writes to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the full content of an object
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write an object, replacing any existing one
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError>;
}

/// Content store backed by Amazon S3 (or an S3-compatible endpoint)
#[derive(Debug, Clone)]
pub struct S3ContentStore {
    client: S3Client,
}

impl S3ContentStore {
    /// Create a store from the ambient AWS configuration
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let aws_config = loader.load().await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            region = ?aws_config.region(),
            endpoint_url = ?config.endpoint_url,
            "S3 content store initialized"
        );

        Self { client }
    }
}

/// Classify an SDK failure for the given object
fn classify<E, R>(err: SdkError<E, R>, bucket: &str, key: &str) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_owned);
    match code.as_deref() {
        Some("NoSuchKey") | Some("NoSuchBucket") | Some("NotFound") => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some("AccessDenied") | Some("Forbidden") => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Request(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body(e.to_string()))?
            .into_bytes()
            .to_vec();

        debug!(size_bytes = body.len(), "Object fetched from S3");
        Ok(body)
    }

    #[instrument(skip(self, body), fields(size_bytes = body.len()))]
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(OUTPUT_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| classify(e, bucket, key))?;

        debug!("Object written to S3");
        Ok(())
    }
}
