//! Per-transport failure dispositions for adapters.
//!
//! The envelope is transport-neutral; this module tells each adapter what
//! to do with it. HTTP maps the error kind to a status code, topic events
//! are logged and dropped, and worker failures are marked retryable or not
//! for the queue's own retry policy. Pure mapping, no I/O.

use http::StatusCode;
use tracing::warn;

use junction_core::{DispatchOutcome, ErrorKind};

/// What a worker-queue adapter should do with a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerDisposition {
    /// Handler succeeded; complete the job.
    Complete,
    /// Execution or timeout failure; hand the job to the queue's retry
    /// policy.
    FailRetryable,
    /// No handler to retry against (or malformed routing); fail permanently.
    FailPermanent,
}

/// HTTP status for an outcome: 200 on success, 404 for a missing handler,
/// 504 for an elapsed deadline, 5xx/4xx otherwise by classification.
#[must_use]
pub fn http_status(outcome: &DispatchOutcome) -> StatusCode {
    match outcome.error() {
        None => StatusCode::OK,
        Some(error) => match error.kind {
            ErrorKind::HandlerNotFound => StatusCode::NOT_FOUND,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::InvalidMetadata => StatusCode::BAD_REQUEST,
            ErrorKind::HandlerExecution | ErrorKind::ModuleLoad => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

/// Queue disposition for an outcome.
#[must_use]
pub fn worker_disposition(outcome: &DispatchOutcome) -> WorkerDisposition {
    match outcome.error() {
        None => WorkerDisposition::Complete,
        Some(error) => match error.kind {
            ErrorKind::HandlerExecution | ErrorKind::Timeout => WorkerDisposition::FailRetryable,
            ErrorKind::HandlerNotFound | ErrorKind::InvalidMetadata | ErrorKind::ModuleLoad => {
                WorkerDisposition::FailPermanent
            }
        },
    }
}

/// Topic adapters drop failed events after logging; successes need nothing.
pub fn log_topic_outcome(topic: &str, outcome: &DispatchOutcome) {
    if let Some(error) = outcome.error() {
        warn!(
            topic,
            kind = error.kind.as_str(),
            message = %error.message,
            "topic event dropped"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_maps_to_ok_everywhere() {
        let outcome = DispatchOutcome::ok(json!({"id": 1}));
        assert_eq!(http_status(&outcome), StatusCode::OK);
        assert_eq!(worker_disposition(&outcome), WorkerDisposition::Complete);
    }

    #[test]
    fn not_found_is_client_visible_and_non_retryable() {
        let outcome = DispatchOutcome::err(ErrorKind::HandlerNotFound, "no handler");
        assert_eq!(http_status(&outcome), StatusCode::NOT_FOUND);
        assert_eq!(
            worker_disposition(&outcome),
            WorkerDisposition::FailPermanent
        );
    }

    #[test]
    fn execution_failure_is_5xx_and_retryable() {
        let outcome = DispatchOutcome::err(ErrorKind::HandlerExecution, "boom");
        assert_eq!(http_status(&outcome), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            worker_disposition(&outcome),
            WorkerDisposition::FailRetryable
        );
    }

    #[test]
    fn timeout_is_distinct_for_http_but_retries_like_execution() {
        let outcome = DispatchOutcome::err(ErrorKind::Timeout, "deadline elapsed");
        assert_eq!(http_status(&outcome), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            worker_disposition(&outcome),
            WorkerDisposition::FailRetryable
        );
    }

    #[test]
    fn topic_logging_accepts_both_shapes() {
        // Smoke test: neither shape panics the logger path.
        log_topic_outcome("user.created", &DispatchOutcome::ok(json!(null)));
        log_topic_outcome(
            "user.created",
            &DispatchOutcome::err(ErrorKind::HandlerExecution, "boom"),
        );
    }
}
