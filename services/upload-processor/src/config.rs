use serde::Deserialize;

/// Output bucket used when `OUTPUT_BUCKET` is not configured
pub const DEFAULT_OUTPUT_BUCKET: &str = "anagram-output-bucket-20250420";

/// Main configuration for the upload processor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// S3 client configuration
    #[serde(default)]
    pub s3: S3Config,
    /// Bucket receiving processed objects (`OUTPUT_BUCKET`)
    #[serde(default)]
    pub output_bucket: Option<String>,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// S3 client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Config {
    /// AWS region; the ambient AWS region is used when unset
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
}

fn default_service_name() -> String {
    "upload-processor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from config files and the process environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading environment variables from `env` instead
    /// of the process environment when given
    pub fn load_from(env: Option<config::Map<String, String>>) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", default_service_name())?
            .set_default("service.log_level", default_log_level())?
            .add_source(config::File::with_name("config/upload-processor").required(false))
            .add_source(config::File::with_name("/etc/upload-processor/config").required(false))
            // UPLOAD__S3__ENDPOINT_URL -> s3.endpoint_url
            .add_source(
                config::Environment::with_prefix("UPLOAD")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            )
            // OUTPUT_BUCKET -> output_bucket
            .add_source(
                config::Environment::with_prefix("OUTPUT")
                    .keep_prefix(true)
                    .source(env),
            )
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Configured output bucket, ignoring blank values
    pub fn output_bucket(&self) -> Option<&str> {
        self.output_bucket
            .as_deref()
            .map(str::trim)
            .filter(|bucket| !bucket.is_empty())
    }
}
