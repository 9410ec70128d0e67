use serde::Deserialize;
use thiserror::Error;

/// Reasons a notification payload cannot be turned into an object location
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Invalid event payload: {0}")]
    Malformed(String),

    #[error("Invalid event: no Records found")]
    NoRecords,

    #[error("Invalid event: missing {0} in first record")]
    MissingField(&'static str),
}

/// Storage-change notification delivered by the invoking framework.
///
/// Records are kept as raw JSON: only the first one is ever interpreted, so
/// the shape of the others does not matter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notification {
    #[serde(rename = "Records", default)]
    pub records: Vec<serde_json::Value>,
}

/// Typed view of the first record
#[derive(Debug, Clone, Deserialize)]
struct NotificationRecord {
    #[serde(default)]
    s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Entity {
    #[serde(default)]
    bucket: Option<S3Bucket>,
    #[serde(default)]
    object: Option<S3Object>,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Bucket {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Object {
    #[serde(default)]
    key: Option<String>,
}

/// Bucket and key of an object in the content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

impl Notification {
    /// Parse a notification from a raw invocation payload
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, EventError> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        Notification::deserialize(payload).map_err(|e| EventError::Malformed(e.to_string()))
    }

    /// Build a notification for a single object
    #[cfg(test)]
    pub(crate) fn for_object(bucket: &str, key: &str) -> Self {
        Self {
            records: vec![serde_json::json!({
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key }
                }
            })],
        }
    }

    /// Extract the location named by the first record.
    ///
    /// Additional records are ignored.
    pub fn first_location(&self) -> Result<ObjectLocation, EventError> {
        let raw = self.records.first().ok_or(EventError::NoRecords)?;
        let record = NotificationRecord::deserialize(raw)
            .map_err(|e| EventError::Malformed(e.to_string()))?;
        let s3 = record.s3.ok_or(EventError::MissingField("s3"))?;

        let bucket = s3
            .bucket
            .and_then(|b| b.name)
            .filter(|name| !name.is_empty())
            .ok_or(EventError::MissingField("bucket name"))?;

        let key = s3
            .object
            .and_then(|o| o.key)
            .filter(|key| !key.is_empty())
            .ok_or(EventError::MissingField("object key"))?;

        Ok(ObjectLocation { bucket, key })
    }
}
