//! Dispatch resolution: one stateless pass per inbound event.
//!
//! The resolver derives the handler identity from the adapter-supplied
//! event, looks it up, builds the transport-specific invocation context,
//! invokes the handler, and normalizes the outcome. Exactly two envelope
//! shapes ever reach an adapter; a handler's raw error type never does.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tower::Service;

use junction_core::{
    DispatchOutcome, ErrorKind, HandlerIdentity, InvalidMetadataError, TransportKind,
};

use crate::context::{ConnectionHandle, InvocationContext, JobInfo};
use crate::registry::HandlerRegistry;

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Dispatch-time failures, always surfaced to the adapter via the envelope.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for {identity}")]
    HandlerNotFound { identity: HandlerIdentity },
    #[error("handler failed: {source}")]
    HandlerExecution {
        #[from]
        source: anyhow::Error,
    },
    #[error("dispatch exceeded {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },
    #[error("invalid routing key: {0}")]
    InvalidRouting(#[from] InvalidMetadataError),
}

impl DispatchError {
    /// Classification carried in the error envelope.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::HandlerNotFound { .. } => ErrorKind::HandlerNotFound,
            DispatchError::HandlerExecution { .. } => ErrorKind::HandlerExecution,
            DispatchError::Timeout { .. } => ErrorKind::Timeout,
            DispatchError::InvalidRouting(_) => ErrorKind::InvalidMetadata,
        }
    }
}

/// Normalize a pipeline result into the adapter-facing envelope.
#[must_use]
pub fn envelope_result(result: Result<Value, DispatchError>) -> DispatchOutcome {
    match result {
        Ok(data) => DispatchOutcome::ok(data),
        Err(error) => DispatchOutcome::err(error.kind(), error.to_string()),
    }
}

// ---------------------------------------------------------------------------
// InboundEvent
// ---------------------------------------------------------------------------

/// Raw inbound invocation produced by a transport adapter.
///
/// The transport kind is carried by the variant: an HTTP adapter always
/// constructs `Http`, and so on. Classification is supplied, never inferred.
pub enum InboundEvent {
    Http {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: Value,
        /// Adapter-imposed deadline, if any.
        deadline_ms: Option<u64>,
    },
    Topic {
        topic: String,
        payload: Value,
        connection: Option<Arc<dyn ConnectionHandle>>,
        deadline_ms: Option<u64>,
    },
    Worker {
        queue: String,
        payload: Value,
        job: JobInfo,
        deadline_ms: Option<u64>,
    },
}

impl InboundEvent {
    /// A bare HTTP event with no headers and no deadline.
    #[must_use]
    pub fn http(method: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        InboundEvent::Http {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body,
            deadline_ms: None,
        }
    }

    /// A topic event with no originating connection and no deadline.
    #[must_use]
    pub fn topic(topic: impl Into<String>, payload: Value) -> Self {
        InboundEvent::Topic {
            topic: topic.into(),
            payload,
            connection: None,
            deadline_ms: None,
        }
    }

    /// A worker job event with no deadline.
    #[must_use]
    pub fn worker(queue: impl Into<String>, payload: Value, job: JobInfo) -> Self {
        InboundEvent::Worker {
            queue: queue.into(),
            payload,
            job,
            deadline_ms: None,
        }
    }

    /// Attach an adapter-imposed deadline.
    #[must_use]
    pub fn with_deadline_ms(mut self, ms: u64) -> Self {
        match &mut self {
            InboundEvent::Http { deadline_ms, .. }
            | InboundEvent::Topic { deadline_ms, .. }
            | InboundEvent::Worker { deadline_ms, .. } => *deadline_ms = Some(ms),
        }
        self
    }

    #[must_use]
    pub fn kind(&self) -> TransportKind {
        match self {
            InboundEvent::Http { .. } => TransportKind::Http,
            InboundEvent::Topic { .. } => TransportKind::Topic,
            InboundEvent::Worker { .. } => TransportKind::Worker,
        }
    }

    #[must_use]
    pub fn deadline_ms(&self) -> Option<u64> {
        match self {
            InboundEvent::Http { deadline_ms, .. }
            | InboundEvent::Topic { deadline_ms, .. }
            | InboundEvent::Worker { deadline_ms, .. } => *deadline_ms,
        }
    }

    /// Routing key rendered for logs and spans; never fails.
    #[must_use]
    pub fn routing_label(&self) -> String {
        match self {
            InboundEvent::Http { method, path, .. } => format!("{method} {path}"),
            InboundEvent::Topic { topic, .. } => topic.clone(),
            InboundEvent::Worker { queue, .. } => queue.clone(),
        }
    }

    /// Derive the handler identity for this event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError` if the adapter supplied an empty
    /// routing key.
    pub fn identity(&self) -> Result<HandlerIdentity, InvalidMetadataError> {
        match self {
            InboundEvent::Http { method, path, .. } => HandlerIdentity::http(method, path),
            InboundEvent::Topic { topic, .. } => HandlerIdentity::topic(topic),
            InboundEvent::Worker { queue, .. } => HandlerIdentity::worker(queue),
        }
    }

    /// Consume the event into the context handed to the handler.
    fn into_context(self) -> InvocationContext {
        match self {
            InboundEvent::Http {
                method,
                path,
                headers,
                body,
                ..
            } => InvocationContext::Http {
                method: method.to_ascii_uppercase(),
                path: junction_core::identity::normalize_http_path(&path),
                headers,
                body,
            },
            InboundEvent::Topic {
                topic,
                payload,
                connection,
                ..
            } => InvocationContext::Topic {
                topic,
                payload,
                connection,
            },
            InboundEvent::Worker {
                queue, payload, job, ..
            } => InvocationContext::Worker {
                queue,
                payload,
                job,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Stateless per-event dispatcher over a sealed registry.
///
/// Many dispatches may run concurrently; each performs read-only registry
/// lookups and shares nothing with the others.
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<HandlerRegistry>,
}

impl Resolver {
    /// A resolver over the given registry. Obtain one through
    /// [`crate::runtime::DispatchRuntime`] in production code so dispatch
    /// cannot start before discovery finishes.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// One resolver pass: derive identity, look up, build context, invoke.
    ///
    /// # Errors
    ///
    /// - `DispatchError::InvalidRouting` if the event's routing key is empty
    /// - `DispatchError::HandlerNotFound` if no entry matches; the handler
    ///   is never invoked
    /// - `DispatchError::HandlerExecution` if the handler returned an error
    pub async fn dispatch(&self, event: InboundEvent) -> Result<Value, DispatchError> {
        let identity = event.identity()?;
        let Some(entry) = self.registry.lookup(&identity) else {
            return Err(DispatchError::HandlerNotFound { identity });
        };

        let ctx = event.into_context();
        let data = entry.instance().handle(ctx).await?;
        Ok(data)
    }

    /// Dispatch and normalize into the uniform envelope. This is the
    /// adapter-facing entry point.
    pub async fn dispatch_enveloped(&self, event: InboundEvent) -> DispatchOutcome {
        envelope_result(self.dispatch(event).await)
    }
}

// ---------------------------------------------------------------------------
// DispatchService (tower adapter)
// ---------------------------------------------------------------------------

type BoxedFuture = Pin<Box<dyn Future<Output = Result<Value, DispatchError>> + Send>>;

/// `tower::Service` face of the resolver, so deadline and tracing layers
/// can wrap dispatch the same way other middleware stacks do.
#[derive(Clone)]
pub struct DispatchService {
    resolver: Resolver,
}

impl DispatchService {
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }
}

impl Service<InboundEvent> for DispatchService {
    type Response = Value;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: InboundEvent) -> Self::Future {
        let resolver = self.resolver.clone();
        Box::pin(async move { resolver.dispatch(event).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
