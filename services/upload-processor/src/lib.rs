//! Upload Processor
//!
//! Event handler for new objects landing in an S3 bucket. For every
//! notification the processor fetches the object, decodes its text with a
//! best-effort encoding chain, uppercases it and writes the result to
//! `processed/<key>` in the output bucket.
//!
//! ## Architecture
//!
//! ```text
//! S3 Notification          Upload Processor                 Output Bucket
//! ┌──────────────┐        ┌──────────────────┐            ┌──────────────┐
//! │ Records[0]   │───────▶│ validate         │            │ processed/   │
//! │  bucket/key  │        │ fetch  ◀─────────┼── S3 get   │   {key}      │
//! └──────────────┘        │ decode           │            └──────────────┘
//!                         │ uppercase        │                   ▲
//!                         │ store  ──────────┼── S3 put ─────────┘
//!                         └──────────────────┘
//!                                  │
//!                                  ▼
//!                         { statusCode, body }
//! ```

pub mod config;
pub mod decode;
pub mod event;
pub mod processor;
pub mod store;
pub mod transform;

pub use config::{Config, DEFAULT_OUTPUT_BUCKET};
pub use decode::{Decoded, DecodeStrategy, Decoder};
pub use event::{EventError, Notification, ObjectLocation};
pub use processor::{ProcessError, ProcessedObject, ProcessorResponse, UploadProcessor};
pub use store::{ContentStore, S3ContentStore, StoreError};
