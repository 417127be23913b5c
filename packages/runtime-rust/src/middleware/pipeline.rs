//! Pipeline composition: wraps the resolver's dispatch service with the
//! middleware layers.

use serde_json::Value;
use tower::ServiceBuilder;

use super::deadline::DeadlineLayer;
use super::trace::TraceLayer;
use crate::config::RuntimeConfig;
use crate::resolver::{DispatchError, DispatchService, InboundEvent, Resolver};

/// Build the dispatch pipeline around a resolver.
///
/// Layer order (outermost to innermost):
/// 1. `DeadlineLayer` -- bound the whole pass, including span bookkeeping
/// 2. `TraceLayer` -- record timing and outcome (closest to the dispatch)
///
/// The returned service implements `tower::Service<InboundEvent>` and
/// produces the same `Result` as `Resolver::dispatch`; adapters normalize
/// it with [`crate::resolver::envelope_result`].
#[must_use]
pub fn build_dispatch_pipeline(
    resolver: Resolver,
    config: &RuntimeConfig,
) -> impl tower::Service<InboundEvent, Response = Value, Error = DispatchError> + Clone {
    ServiceBuilder::new()
        .layer(DeadlineLayer::new(config.default_deadline_ms))
        .layer(TraceLayer)
        .service(DispatchService::new(resolver))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
