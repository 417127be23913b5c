//! The uniform result envelope returned to transport adapters.
//!
//! Exactly two shapes ever cross the resolver boundary:
//!
//! ```json
//! {"ok": true,  "data": <any>}
//! {"ok": false, "error": {"kind": "<ErrorKind>", "message": "<text>"}}
//! ```
//!
//! A handler's raw internal error type never appears here; only its message
//! text and a classification survive.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Classification carried in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No registry entry matched the inbound routing key.
    HandlerNotFound,
    /// The handler returned or raised an error during invocation.
    HandlerExecution,
    /// An adapter-imposed deadline elapsed before the handler finished.
    /// Envelope-wise identical to `HandlerExecution`, tagged distinctly
    /// for observability.
    Timeout,
    /// Malformed tag input at declaration time.
    InvalidMetadata,
    /// A handler-definition unit failed to load during discovery.
    ModuleLoad,
}

impl ErrorKind {
    /// Wire string used in the serialized envelope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::HandlerNotFound => "HandlerNotFoundError",
            ErrorKind::HandlerExecution => "HandlerExecutionError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::InvalidMetadata => "InvalidMetadataError",
            ErrorKind::ModuleLoad => "ModuleLoadError",
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorEnvelope
// ---------------------------------------------------------------------------

/// The `error` object of a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Serialize for ErrorEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ErrorEnvelope", 2)?;
        s.serialize_field("kind", self.kind.as_str())?;
        s.serialize_field("message", &self.message)?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// DispatchOutcome
// ---------------------------------------------------------------------------

/// Normalized result of one resolver pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Handler completed; its return value is the payload.
    Ok(serde_json::Value),
    /// Dispatch failed; classification and message only.
    Err(ErrorEnvelope),
}

impl DispatchOutcome {
    #[must_use]
    pub fn ok(data: serde_json::Value) -> Self {
        DispatchOutcome::Ok(data)
    }

    #[must_use]
    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        DispatchOutcome::Err(ErrorEnvelope::new(kind, message))
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchOutcome::Ok(_))
    }

    /// The error envelope, if this outcome is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorEnvelope> {
        match self {
            DispatchOutcome::Ok(_) => None,
            DispatchOutcome::Err(e) => Some(e),
        }
    }
}

impl Serialize for DispatchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DispatchOutcome::Ok(data) => {
                let mut s = serializer.serialize_struct("DispatchOutcome", 2)?;
                s.serialize_field("ok", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            DispatchOutcome::Err(error) => {
                let mut s = serializer.serialize_struct("DispatchOutcome", 2)?;
                s.serialize_field("ok", &false)?;
                s.serialize_field("error", error)?;
                s.end()
            }
        }
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
    fn success_envelope_shape() {
        let outcome = DispatchOutcome::ok(json!({"id": 7}));
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire, json!({"ok": true, "data": {"id": 7}}));
    }

    #[test]
    fn error_envelope_shape() {
        let outcome = DispatchOutcome::err(ErrorKind::HandlerNotFound, "no handler for topic x");
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            wire,
            json!({
                "ok": false,
                "error": {
                    "kind": "HandlerNotFoundError",
                    "message": "no handler for topic x",
                }
            })
        );
    }

    #[test]
    fn kind_wire_strings_are_stable() {
        assert_eq!(ErrorKind::HandlerExecution.as_str(), "HandlerExecutionError");
        assert_eq!(ErrorKind::Timeout.as_str(), "TimeoutError");
        assert_eq!(ErrorKind::InvalidMetadata.as_str(), "InvalidMetadataError");
        assert_eq!(ErrorKind::ModuleLoad.as_str(), "ModuleLoadError");
    }

    #[test]
    fn accessors() {
        let ok = DispatchOutcome::ok(json!(null));
        assert!(ok.is_ok());
        assert!(ok.error().is_none());

        let err = DispatchOutcome::err(ErrorKind::Timeout, "deadline elapsed");
        assert!(!err.is_ok());
        assert_eq!(err.error().unwrap().kind, ErrorKind::Timeout);
    }
}
