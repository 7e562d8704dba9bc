use serde::Serialize;

use crate::config::CopyConfig;
use crate::event::{EventError, S3EventNotification};
use crate::keys::{copy_source, decode_object_key, destination_key};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// A server-side copy of `source` into `destination`. Keys are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: ObjectLocation,
    pub destination: ObjectLocation,
}

impl CopyRequest {
    pub fn copy_source(&self) -> String {
        copy_source(&self.source.bucket, &self.source.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyPlan {
    Copy(CopyRequest),
    /// The object already lives in the output bucket.
    Skip(ObjectLocation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub plan: CopyPlan,
    pub output_bucket: String,
    pub event_name: Option<String>,
    pub version_id: Option<String>,
    /// Records after the first one; they are not acted on.
    pub ignored_records: usize,
}

impl PlanSummary {
    pub fn source(&self) -> &ObjectLocation {
        match &self.plan {
            CopyPlan::Copy(request) => &request.source,
            CopyPlan::Skip(location) => location,
        }
    }
}

/// Plans the copy for the first record of `event`.
pub fn plan_copy(
    event: &S3EventNotification,
    config: &CopyConfig,
) -> Result<PlanSummary, EventError> {
    let Some(record) = event.records.first() else {
        return Err(EventError::NoRecords);
    };

    let source = ObjectLocation::new(
        record.s3.bucket.name.clone(),
        decode_object_key(&record.s3.object.key),
    );
    let ignored_records = event.records.len() - 1;

    let plan = if source.bucket == config.output_bucket {
        CopyPlan::Skip(source)
    } else {
        let destination =
            ObjectLocation::new(config.output_bucket.clone(), destination_key(&source.key));
        CopyPlan::Copy(CopyRequest {
            source,
            destination,
        })
    };

    Ok(PlanSummary {
        plan,
        output_bucket: config.output_bucket.clone(),
        event_name: record.event_name.clone(),
        version_id: record.s3.object.version_id.clone(),
        ignored_records,
    })
}
