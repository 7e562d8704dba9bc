use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Storage event notification as delivered by the bucket trigger.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

/// Object reference inside a record. `key` is still percent-encoded here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    pub key: String,
    #[serde(rename = "versionId", default)]
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event notification contains no records")]
    NoRecords,
    #[error("malformed event notification: {0}")]
    Malformed(String),
}

pub fn parse_event(event: Value) -> Result<S3EventNotification, EventError> {
    serde_json::from_value(event).map_err(|error| EventError::Malformed(error.to_string()))
}
