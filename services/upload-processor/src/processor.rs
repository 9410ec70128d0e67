//! The upload processing pipeline.
//!
//! One invocation runs validate → fetch → decode → transform → store and
//! always produces a [`ProcessorResponse`]; failures are mapped to status
//! codes instead of escaping the handler.

use crate::config::DEFAULT_OUTPUT_BUCKET;
use crate::decode::Decoder;
use crate::event::{EventError, Notification, ObjectLocation};
use crate::store::{ContentStore, StoreError};
use crate::transform;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Confirmation message returned on success
pub const SUCCESS_MESSAGE: &str = "File processed successfully";

/// Errors that can occur while processing an upload
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] EventError),

    #[error("Error retrieving object {key} from bucket {bucket}")]
    Retrieval {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Error saving processed file to {bucket}/{key}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Error processing file: {0}")]
    Unclassified(String),
}

impl ProcessError {
    /// HTTP-style status code reported for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ProcessError::Validation(_) => 400,
            ProcessError::Retrieval { .. }
            | ProcessError::Storage { .. }
            | ProcessError::Unclassified(_) => 500,
        }
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Validation(_) => "validation",
            ProcessError::Retrieval { .. } => "retrieval",
            ProcessError::Storage { .. } => "storage",
            ProcessError::Unclassified(_) => "unclassified",
        }
    }

    /// Message reported to the caller, including the store failure if any
    pub fn message(&self) -> String {
        match self {
            ProcessError::Retrieval { source, .. } | ProcessError::Storage { source, .. } => {
                format!("{self}: {source}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result returned to the invoking framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorResponse {
    pub status_code: u16,
    /// JSON-encoded message string
    pub body: String,
}

impl ProcessorResponse {
    fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: serde_json::Value::String(message.into()).to_string(),
        }
    }

    pub fn success() -> Self {
        Self::new(200, SUCCESS_MESSAGE)
    }

    pub fn from_error(error: &ProcessError) -> Self {
        Self::new(error.status_code(), error.message())
    }

    /// Decode the message carried in `body`
    pub fn message(&self) -> Option<String> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Summary of a successfully processed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedObject {
    pub source: ObjectLocation,
    pub output: ObjectLocation,
    pub encoding: &'static str,
    pub bytes_written: usize,
}

/// Processes storage notifications against a content store
pub struct UploadProcessor<S> {
    store: Arc<S>,
    decoder: Decoder,
    output_bucket: Option<String>,
}

impl<S: ContentStore> UploadProcessor<S> {
    /// Create a processor writing to `output_bucket`, or to the default
    /// bucket when none is configured
    pub fn new(store: Arc<S>, output_bucket: Option<String>) -> Self {
        Self {
            store,
            decoder: Decoder::default(),
            output_bucket,
        }
    }

    /// Replace the decoder chain
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Handle one invocation payload. Never fails: every error is converted
    /// into a response.
    #[instrument(skip(self, payload))]
    pub async fn handle(&self, payload: &serde_json::Value) -> ProcessorResponse {
        let outcome = AssertUnwindSafe(self.process_payload(payload))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ProcessError::Unclassified(panic_message(panic.as_ref())))
            });

        match outcome {
            Ok(processed) => {
                metrics::counter!("upload_processor.objects.processed").increment(1);
                metrics::counter!("upload_processor.bytes.written")
                    .increment(processed.bytes_written as u64);
                ProcessorResponse::success()
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e.message(), "Failed to process upload");
                metrics::counter!("upload_processor.objects.failed", "kind" => e.kind())
                    .increment(1);
                ProcessorResponse::from_error(&e)
            }
        }
    }

    async fn process_payload(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ProcessedObject, ProcessError> {
        let notification = Notification::from_payload(payload)?;
        self.process(&notification).await
    }

    /// Run the pipeline for the first record of a notification
    #[instrument(skip(self, notification))]
    pub async fn process(
        &self,
        notification: &Notification,
    ) -> Result<ProcessedObject, ProcessError> {
        let source = notification.first_location()?;
        if notification.records.len() > 1 {
            debug!(
                ignored = notification.records.len() - 1,
                "Ignoring additional records"
            );
        }

        info!(bucket = %source.bucket, key = %source.key, "Processing file");

        let content = self
            .store
            .get(&source.bucket, &source.key)
            .await
            .map_err(|e| ProcessError::Retrieval {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
                source: e,
            })?;

        let decoded = self.decoder.decode(&content);
        debug!(
            encoding = decoded.encoding,
            size_bytes = content.len(),
            "Decoded object content"
        );

        let body = transform::uppercase(&decoded.text).into_bytes();
        let output = ObjectLocation {
            bucket: self.output_bucket().to_string(),
            key: transform::output_key(&source.key),
        };
        let bytes_written = body.len();

        self.store
            .put(&output.bucket, &output.key, body)
            .await
            .map_err(|e| ProcessError::Storage {
                bucket: output.bucket.clone(),
                key: output.key.clone(),
                source: e,
            })?;

        info!(
            output_bucket = %output.bucket,
            output_key = %output.key,
            size_bytes = bytes_written,
            "Saved processed file"
        );

        Ok(ProcessedObject {
            source,
            output,
            encoding: decoded.encoding,
            bytes_written,
        })
    }

    /// Bucket receiving processed objects
    pub fn output_bucket(&self) -> &str {
        match self
            .output_bucket
            .as_deref()
            .filter(|bucket| !bucket.trim().is_empty())
        {
            Some(bucket) => bucket,
            None => {
                warn!(
                    default_bucket = DEFAULT_OUTPUT_BUCKET,
                    "OUTPUT_BUCKET not set, using default bucket"
                );
                DEFAULT_OUTPUT_BUCKET
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
