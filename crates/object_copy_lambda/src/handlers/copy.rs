use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::object_store::ObjectCopier;
use crate::runtime::config::CopyConfig;
use crate::runtime::event::{parse_event, EventError};
use crate::runtime::plan::{plan_copy, CopyPlan, ObjectLocation};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied {
        source: ObjectLocation,
        destination: ObjectLocation,
    },
    Skipped {
        source: ObjectLocation,
    },
}

#[derive(Debug, Error)]
pub enum CopyHandlerError {
    #[error(transparent)]
    MalformedEvent(#[from] EventError),
    #[error("failed to copy {from} -> {to}: {message}")]
    CopyFailed {
        from: ObjectLocation,
        to: ObjectLocation,
        message: String,
    },
}

/// Copies the object named by the first record of `event` into the output
/// bucket under a `resized-` key.
///
/// Objects already in the output bucket are skipped so that a trigger on the
/// output bucket cannot loop. Copy failures are returned as-is; retrying is
/// left to the invoking runtime.
pub fn handle_copy_event(
    event: Value,
    config: &CopyConfig,
    copier: &impl ObjectCopier,
) -> Result<CopyOutcome, CopyHandlerError> {
    let notification = parse_event(event)?;
    let summary = plan_copy(&notification, config)?;

    if summary.ignored_records > 0 {
        warn!(
            ignored_records = summary.ignored_records,
            "event carries more than one record, only the first is processed"
        );
    }

    let source = summary.source();
    info!(
        source_bucket = %source.bucket,
        source_key = %source.key,
        output_bucket = %summary.output_bucket,
        event_name = summary.event_name.as_deref(),
        version_id = summary.version_id.as_deref(),
        "received object notification"
    );

    let request = match summary.plan {
        CopyPlan::Skip(source) => {
            info!(
                source_bucket = %source.bucket,
                source_key = %source.key,
                "object is already in output bucket, skipping"
            );
            return Ok(CopyOutcome::Skipped { source });
        }
        CopyPlan::Copy(request) => request,
    };

    copier
        .copy_object(&request)
        .map_err(|message| CopyHandlerError::CopyFailed {
            from: request.source.clone(),
            to: request.destination.clone(),
            message,
        })?;

    info!(
        source = %request.source,
        destination = %request.destination,
        "copied object"
    );
    Ok(CopyOutcome::Copied {
        source: request.source,
        destination: request.destination,
    })
}

/// Lambda-facing entry point: the outcome is dropped and any handler error
/// fails the invocation.
pub fn handle_invocation(
    event: Value,
    config: &CopyConfig,
    copier: &impl ObjectCopier,
) -> Result<(), lambda_runtime::Error> {
    handle_copy_event(event, config, copier)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::runtime::plan::CopyRequest;

    struct RecordingCopier {
        requests: Mutex<Vec<CopyRequest>>,
    }

    impl RecordingCopier {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<CopyRequest> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    impl ObjectCopier for RecordingCopier {
        fn copy_object(&self, request: &CopyRequest) -> Result<(), String> {
            self.requests
                .lock()
                .expect("poisoned mutex")
                .push(request.clone());
            Ok(())
        }
    }

    struct FailingCopier {
        attempts: Mutex<usize>,
    }

    impl FailingCopier {
        fn new() -> Self {
            Self {
                attempts: Mutex::new(0),
            }
        }

        fn attempts(&self) -> usize {
            *self.attempts.lock().expect("poisoned mutex")
        }
    }

    impl ObjectCopier for FailingCopier {
        fn copy_object(&self, _request: &CopyRequest) -> Result<(), String> {
            *self.attempts.lock().expect("poisoned mutex") += 1;
            Err("AccessDenied: access denied".to_string())
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().expect("poisoned mutex")).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer
                .lock()
                .expect("poisoned mutex")
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<T>(run: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, run);
        (result, logs.contents())
    }

    fn sample_event(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [{
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": bucket},
                    "object": {"key": key, "size": 42}
                }
            }]
        })
    }

    fn sample_config() -> CopyConfig {
        CopyConfig::new("processed")
    }

    #[test]
    fn copies_upload_into_output_bucket_with_prefix() {
        let copier = RecordingCopier::new();
        let outcome = handle_copy_event(
            sample_event("uploads", "photo+1.jpg"),
            &sample_config(),
            &copier,
        )
        .expect("copy should succeed");

        let expected = CopyRequest {
            source: ObjectLocation::new("uploads", "photo 1.jpg"),
            destination: ObjectLocation::new("processed", "resized-photo 1.jpg"),
        };
        assert_eq!(copier.requests(), vec![expected.clone()]);
        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                source: expected.source,
                destination: expected.destination,
            }
        );
    }

    #[test]
    fn decodes_key_before_copying() {
        let copier = RecordingCopier::new();
        handle_copy_event(
            sample_event("uploads", "a+b%20c.txt"),
            &sample_config(),
            &copier,
        )
        .expect("copy should succeed");

        let requests = copier.requests();
        assert_eq!(requests[0].source.key, "a b c.txt");
        assert_eq!(requests[0].destination.key, "resized-a b c.txt");
    }

    #[test]
    fn skips_objects_in_output_bucket_without_copying() {
        let copier = RecordingCopier::new();
        let outcome = handle_copy_event(
            sample_event("processed", "resized-photo.jpg"),
            &sample_config(),
            &copier,
        )
        .expect("skip should succeed");

        assert!(copier.requests().is_empty());
        assert_eq!(
            outcome,
            CopyOutcome::Skipped {
                source: ObjectLocation::new("processed", "resized-photo.jpg"),
            }
        );
    }

    #[test]
    fn repeated_event_issues_repeated_copies() {
        let copier = RecordingCopier::new();
        let config = sample_config();
        for _ in 0..2 {
            handle_copy_event(sample_event("uploads", "a.jpg"), &config, &copier)
                .expect("copy should succeed");
        }

        let requests = copier.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn only_first_record_is_copied() {
        let copier = RecordingCopier::new();
        let event = json!({
            "Records": [
                {"s3": {"bucket": {"name": "uploads"}, "object": {"key": "first.jpg"}}},
                {"s3": {"bucket": {"name": "uploads"}, "object": {"key": "second.jpg"}}}
            ]
        });

        handle_copy_event(event, &sample_config(), &copier).expect("copy should succeed");

        let requests = copier.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source.key, "first.jpg");
    }

    #[test]
    fn event_without_records_fails_without_copying() {
        let copier = RecordingCopier::new();
        let error = handle_copy_event(json!({"Records": []}), &sample_config(), &copier)
            .expect_err("empty event must fail");

        assert!(matches!(
            error,
            CopyHandlerError::MalformedEvent(EventError::NoRecords)
        ));
        assert!(copier.requests().is_empty());
    }

    #[test]
    fn malformed_record_fails_without_copying() {
        let copier = RecordingCopier::new();
        let error = handle_copy_event(
            json!({"Records": [{"s3": {"bucket": {"name": "uploads"}}}]}),
            &sample_config(),
            &copier,
        )
        .expect_err("record without object must fail");

        assert!(matches!(
            error,
            CopyHandlerError::MalformedEvent(EventError::Malformed(_))
        ));
        assert!(copier.requests().is_empty());
    }

    #[test]
    fn copy_failure_propagates_after_single_attempt() {
        let copier = FailingCopier::new();
        let error = handle_copy_event(
            sample_event("uploads", "photo.jpg"),
            &sample_config(),
            &copier,
        )
        .expect_err("copy failure must propagate");

        assert_eq!(copier.attempts(), 1);
        assert_eq!(
            error.to_string(),
            "failed to copy uploads/photo.jpg -> processed/resized-photo.jpg: AccessDenied: access denied"
        );
    }

    #[test]
    fn logs_decoded_key_and_notification_details() {
        let copier = RecordingCopier::new();
        let mut event = sample_event("uploads", "a+b%20c.txt");
        event["Records"][0]["s3"]["object"]["versionId"] = json!("v-7");

        let (result, logs) =
            with_captured_logs(|| handle_copy_event(event, &sample_config(), &copier));
        result.expect("copy should succeed");

        assert!(logs.contains("\"source_key\":\"a b c.txt\""));
        assert!(logs.contains("\"event_name\":\"ObjectCreated:Put\""));
        assert!(logs.contains("\"version_id\":\"v-7\""));
        assert!(logs.contains("\"destination\":\"processed/resized-a b c.txt\""));
        assert!(!logs.contains("a+b%20c.txt"));
    }

    #[test]
    fn logs_skip_decision() {
        let copier = RecordingCopier::new();
        let (result, logs) = with_captured_logs(|| {
            handle_copy_event(sample_event("processed", "x.jpg"), &sample_config(), &copier)
        });
        result.expect("skip should succeed");

        assert!(logs.contains("object is already in output bucket, skipping"));
    }

    #[test]
    fn handler_errors_become_invocation_failures() {
        let config = sample_config();
        let copier = FailingCopier::new();
        let error = handle_invocation(sample_event("uploads", "photo.jpg"), &config, &copier)
            .expect_err("copy failure must fail the invocation");
        assert_eq!(
            error.to_string(),
            "failed to copy uploads/photo.jpg -> processed/resized-photo.jpg: AccessDenied: access denied"
        );

        let error = handle_invocation(json!({"Records": []}), &config, &RecordingCopier::new())
            .expect_err("empty event must fail the invocation");
        assert_eq!(error.to_string(), "event notification contains no records");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = CopyOutcome::Skipped {
            source: ObjectLocation::new("processed", "a.jpg"),
        };

        assert_eq!(
            serde_json::to_value(&outcome).expect("outcome should serialize"),
            json!({"status": "skipped", "source": {"bucket": "processed", "key": "a.jpg"}})
        );
    }
}
