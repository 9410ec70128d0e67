use anyhow::{Context, Result};
use lambda_runtime::{service_fn, LambdaEvent};
use std::sync::Arc;
use tracing::{info, Instrument};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use upload_processor::{Config, S3ContentStore, UploadProcessor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        output_bucket = ?config.output_bucket(),
        "Starting upload processor"
    );

    let store = Arc::new(S3ContentStore::new(&config.s3).await);
    let processor = Arc::new(UploadProcessor::new(
        store,
        config.output_bucket().map(String::from),
    ));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let processor = processor.clone();
        async move {
            let (payload, context) = event.into_parts();
            let span = tracing::info_span!("invocation", request_id = %context.request_id);
            let response = processor.handle(&payload).instrument(span).await;
            Ok::<_, lambda_runtime::Error>(response)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))?;

    info!("Upload processor stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().without_time())
        .init();
}
