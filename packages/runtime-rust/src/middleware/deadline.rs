//! Deadline middleware for dispatches.
//!
//! The deadline is read from each event's `deadline_ms` (adapter-imposed),
//! falling back to the configured default. An elapsed deadline maps to
//! `DispatchError::Timeout`, which the envelope tags distinctly from other
//! handler failures for observability.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::Value;
use tower::{Layer, Service};

use crate::resolver::{DispatchError, InboundEvent};

// ---------------------------------------------------------------------------
// DeadlineLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with per-event deadline enforcement.
#[derive(Debug, Clone)]
pub struct DeadlineLayer {
    default_deadline_ms: u64,
}

impl DeadlineLayer {
    #[must_use]
    pub fn new(default_deadline_ms: u64) -> Self {
        Self { default_deadline_ms }
    }
}

impl<S> Layer<S> for DeadlineLayer {
    type Service = DeadlineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DeadlineService {
            inner,
            default_deadline_ms: self.default_deadline_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// DeadlineService
// ---------------------------------------------------------------------------

/// Service wrapper enforcing the event deadline.
#[derive(Debug, Clone)]
pub struct DeadlineService<S> {
    inner: S,
    default_deadline_ms: u64,
}

impl<S> Service<InboundEvent> for DeadlineService<S>
where
    S: Service<InboundEvent, Response = Value, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = Value;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<Value, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, event: InboundEvent) -> Self::Future {
        let deadline_ms = event.deadline_ms().unwrap_or(self.default_deadline_ms);
        let fut = self.inner.call(event);
        Box::pin(async move {
            let duration = Duration::from_millis(deadline_ms);
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_elapsed) => Err(DispatchError::Timeout { deadline_ms }),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
