//! Tracing middleware for dispatches.
//!
//! Records dispatch duration and outcome in `tracing` spans, not a metrics
//! crate. Each dispatch gets a span carrying the transport kind and the
//! routing label.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use serde_json::Value;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::resolver::{DispatchError, InboundEvent};

// ---------------------------------------------------------------------------
// TraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments dispatches with timing and outcome spans.
#[derive(Debug, Clone)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

// ---------------------------------------------------------------------------
// TraceService
// ---------------------------------------------------------------------------

/// Service wrapper that records dispatch duration and outcome.
#[derive(Debug, Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S> Service<InboundEvent> for TraceService<S>
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
        let span = info_span!(
            "dispatch",
            transport = event.kind().as_str(),
            routing = %event.routing_label(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let start = Instant::now();
        let fut = self.inner.call(event);

        Box::pin(
            async move {
                let result = fut.await;
                let elapsed = start.elapsed().as_millis();
                let span = tracing::Span::current();
                span.record("duration_ms", tracing::field::display(elapsed));
                match &result {
                    Ok(_) => span.record("outcome", "ok"),
                    Err(error) => span.record("outcome", error.kind().as_str()),
                };
                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    struct EchoService;

    impl Service<InboundEvent> for EchoService {
        type Response = Value;
        type Error = DispatchError;
        type Future = Pin<Box<dyn Future<Output = Result<Value, DispatchError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, event: InboundEvent) -> Self::Future {
            let label = event.routing_label();
            Box::pin(async move { Ok(json!(label)) })
        }
    }

    #[tokio::test]
    async fn trace_layer_is_transparent_to_the_result() {
        let svc = TraceLayer.layer(EchoService);
        let out = svc
            .oneshot(InboundEvent::http("GET", "/health", Value::Null))
            .await
            .unwrap();
        assert_eq!(out, json!("GET /health"));
    }
}
