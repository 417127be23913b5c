//! Runtime bootstrap with a strict discovery-before-dispatch lifecycle.
//!
//! `bootstrap()` runs the discovery sweep to completion, logs the per-kind
//! handler listing, and seals the registry before a resolver can be
//! obtained. Dispatch against a partially populated registry is prevented
//! by this sequencing, not merely discouraged.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use junction_core::TransportKind;

use crate::config::RuntimeConfig;
use crate::discovery::{run_discovery, DiscoveryError, DiscoveryReport, HandlerUnit};
use crate::middleware::build_dispatch_pipeline;
use crate::registry::HandlerRegistry;
use crate::resolver::{DispatchError, InboundEvent, Resolver};

/// Owns the sealed registry and hands out dispatch surfaces.
///
/// The registry is an explicit dependency constructed here and injected
/// into every resolver; nothing reaches it through ambient global state.
pub struct DispatchRuntime {
    config: RuntimeConfig,
    registry: Arc<HandlerRegistry>,
    report: DiscoveryReport,
}

impl DispatchRuntime {
    /// Run discovery over `units` and seal the registry.
    ///
    /// Single-threaded; returns only once every candidate unit has been
    /// processed, so any resolver obtained afterwards sees the complete
    /// registration set.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError` if the discovery glob configuration does
    /// not parse. Individual unit failures are recorded in the report, not
    /// surfaced as errors.
    pub fn bootstrap(
        config: RuntimeConfig,
        units: Vec<HandlerUnit>,
    ) -> Result<Self, DiscoveryError> {
        let registry = Arc::new(HandlerRegistry::new());
        let report = run_discovery(&config.discovery, units, &registry)?;

        // Startup diagnostics listing, in registration order.
        for kind in [TransportKind::Http, TransportKind::Topic, TransportKind::Worker] {
            for entry in registry.list_all(kind) {
                info!(
                    transport = kind.as_str(),
                    identity = %entry.metadata().identity(),
                    description = entry.metadata().description().unwrap_or(""),
                    "handler registered"
                );
            }
        }

        registry.seal();
        Ok(Self {
            config,
            registry,
            report,
        })
    }

    /// A resolver over the sealed registry.
    #[must_use]
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.registry))
    }

    /// The middleware-wrapped dispatch service adapters should call.
    #[must_use]
    pub fn dispatch_service(
        &self,
    ) -> impl tower::Service<InboundEvent, Response = Value, Error = DispatchError> + Clone {
        build_dispatch_pipeline(self.resolver(), &self.config)
    }

    /// Shared registry handle, for diagnostics only.
    #[must_use]
    pub fn registry(&self) -> Arc<HandlerRegistry> {
        Arc::clone(&self.registry)
    }

    /// Outcome of the bootstrap discovery sweep.
    #[must_use]
    pub fn report(&self) -> &DiscoveryReport {
        &self.report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::context::InvocationContext;
    use crate::registry::Handler;
    use crate::resolver::envelope_result;

    struct EchoTopicHandler;

    #[async_trait]
    impl Handler for EchoTopicHandler {
        async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<Value> {
            Ok(ctx.payload().clone())
        }
    }

    fn units() -> Vec<HandlerUnit> {
        vec![
            HandlerUnit::new("handlers/events.rs", |buf| {
                buf.declare_topic_handler("user.created", EchoTopicHandler)?;
                Ok(())
            }),
            HandlerUnit::new("handlers/broken.rs", |_buf| {
                anyhow::bail!("reference failure")
            }),
        ]
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("junction_runtime=info")
            .try_init();
    }

    #[tokio::test]
    async fn bootstrap_seals_then_dispatches() {
        init_tracing();
        let runtime = DispatchRuntime::bootstrap(RuntimeConfig::default(), units()).unwrap();
        assert!(runtime.registry().is_sealed());
        assert_eq!(runtime.report().loaded_count(), 1);
        assert_eq!(runtime.report().failed_count(), 1);

        let outcome = runtime
            .resolver()
            .dispatch_enveloped(InboundEvent::topic("user.created", json!({"id": 9})))
            .await;
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"ok": true, "data": {"id": 9}})
        );
    }

    #[tokio::test]
    async fn dispatch_service_goes_through_the_pipeline() {
        let runtime = DispatchRuntime::bootstrap(RuntimeConfig::default(), units()).unwrap();
        let svc = runtime.dispatch_service();

        let ok = svc
            .clone()
            .oneshot(InboundEvent::topic("user.created", json!(1)))
            .await;
        assert!(envelope_result(ok).is_ok());

        let missing = svc.oneshot(InboundEvent::topic("user.deleted", json!(1))).await;
        let outcome = envelope_result(missing);
        assert_eq!(
            outcome.error().unwrap().kind,
            junction_core::ErrorKind::HandlerNotFound
        );
    }

    #[tokio::test]
    async fn concurrent_dispatches_share_the_registry_read_only() {
        let runtime = DispatchRuntime::bootstrap(RuntimeConfig::default(), units()).unwrap();
        let resolver = runtime.resolver();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let resolver = resolver.clone();
            tasks.spawn(async move {
                resolver
                    .dispatch_enveloped(InboundEvent::topic("user.created", json!(i)))
                    .await
            });
        }

        let mut ok = 0;
        while let Some(outcome) = tasks.join_next().await {
            assert!(outcome.unwrap().is_ok());
            ok += 1;
        }
        assert_eq!(ok, 32);
    }

    #[test]
    fn bootstrap_rejects_bad_glob_config() {
        let config = RuntimeConfig {
            discovery: crate::discovery::DiscoveryConfig {
                include: vec!["[".to_string()],
                ..Default::default()
            },
            ..RuntimeConfig::default()
        };
        assert!(DispatchRuntime::bootstrap(config, Vec::new()).is_err());
    }
}
