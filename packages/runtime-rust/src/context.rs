//! Per-invocation context handed to handlers.
//!
//! One `InvocationContext` is built per inbound event by the resolver and
//! dropped after the handler returns. No two invocations share mutable
//! state through the runtime; anything shared lives behind the handler's
//! own collaborators.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// Handle to the originating pub/sub connection of a topic event.
///
/// Implemented by the transport adapter (e.g., over the sender end of a
/// bounded outbound channel). The runtime only forwards the handle into the
/// topic context; it never sends on it itself.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Adapter-assigned connection identifier, for logging.
    fn id(&self) -> u64;

    /// Send a payload back to the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection has been closed or its outbound
    /// channel rejected the message.
    async fn send(&self, payload: Value) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// JobInfo
// ---------------------------------------------------------------------------

/// Queue-assigned metadata for a worker job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    /// Unique job identifier assigned by the queue.
    pub job_id: String,
    /// 1-based delivery attempt; retries increment it.
    pub attempt: u32,
}

// ---------------------------------------------------------------------------
// InvocationContext
// ---------------------------------------------------------------------------

/// Transport-specific view of one inbound event, as seen by a handler.
pub enum InvocationContext {
    /// Synchronous HTTP request; the handler's return value becomes the
    /// response payload.
    Http {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: Value,
    },
    /// Fire-and-forget topic event, with the originating connection when
    /// the adapter still holds one.
    Topic {
        topic: String,
        payload: Value,
        connection: Option<Arc<dyn ConnectionHandle>>,
    },
    /// Background job pulled from a queue.
    Worker {
        queue: String,
        payload: Value,
        job: JobInfo,
    },
}

impl InvocationContext {
    /// The event payload, regardless of transport.
    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            InvocationContext::Http { body, .. } => body,
            InvocationContext::Topic { payload, .. } | InvocationContext::Worker { payload, .. } => {
                payload
            }
        }
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationContext::Http {
                method,
                path,
                headers,
                body,
            } => f
                .debug_struct("Http")
                .field("method", method)
                .field("path", path)
                .field("headers", headers)
                .field("body", body)
                .finish(),
            InvocationContext::Topic {
                topic,
                payload,
                connection,
            } => f
                .debug_struct("Topic")
                .field("topic", topic)
                .field("payload", payload)
                .field("connection", &connection.as_ref().map(|c| c.id()))
                .finish(),
            InvocationContext::Worker {
                queue,
                payload,
                job,
            } => f
                .debug_struct("Worker")
                .field("queue", queue)
                .field("payload", payload)
                .field("job", job)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_accessor_covers_all_variants() {
        let http = InvocationContext::Http {
            method: "GET".to_string(),
            path: "/users".to_string(),
            headers: HashMap::new(),
            body: json!({"q": 1}),
        };
        assert_eq!(http.payload(), &json!({"q": 1}));

        let topic = InvocationContext::Topic {
            topic: "user.created".to_string(),
            payload: json!("hi"),
            connection: None,
        };
        assert_eq!(topic.payload(), &json!("hi"));

        let worker = InvocationContext::Worker {
            queue: "email".to_string(),
            payload: json!([1, 2]),
            job: JobInfo {
                job_id: "j-1".to_string(),
                attempt: 1,
            },
        };
        assert_eq!(worker.payload(), &json!([1, 2]));
    }
}
