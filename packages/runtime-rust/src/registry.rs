//! Identity-keyed handler registry.
//!
//! Written only during the discovery sweep, read concurrently by every
//! dispatch afterwards. `DashMap` gives lock-free concurrent reads; the
//! insertion-order log backs the diagnostics listing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use junction_core::{HandlerIdentity, HandlerMetadata, TransportKind};

use crate::context::InvocationContext;

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// A callable unit of application logic invoked by the resolver.
///
/// Implementations own whatever collaborators they need (persistence,
/// outbound clients); the runtime only calls `handle` and normalizes the
/// result. Errors are wrapped into the uniform error envelope and never
/// reach an adapter as their raw type.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process one invocation. May suspend on downstream async work.
    async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<Value>;
}

// ---------------------------------------------------------------------------
// RegistryEntry
// ---------------------------------------------------------------------------

/// Metadata plus handler instance. The registry holds the sole
/// authoritative copy of the instance once registered.
#[derive(Clone)]
pub struct RegistryEntry {
    metadata: Arc<HandlerMetadata>,
    instance: Arc<dyn Handler>,
}

impl RegistryEntry {
    #[must_use]
    pub fn metadata(&self) -> &HandlerMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn instance(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.instance)
    }
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// Process-wide store mapping handler identity to its registered entry.
///
/// `register` is idempotent at the identity level: a colliding registration
/// replaces the previous entry and emits a non-fatal warning. Lookup is
/// exact-match (HTTP trailing slashes are normalized inside
/// `HandlerIdentity` construction, so both sides already agree).
pub struct HandlerRegistry {
    entries: DashMap<HandlerIdentity, RegistryEntry>,
    /// Registration order for the diagnostics listing. A replaced identity
    /// keeps its original position.
    order: RwLock<Vec<HandlerIdentity>>,
    /// Set once discovery completes; registrations afterwards are a startup
    /// sequencing bug and are logged loudly.
    sealed: AtomicBool,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            order: RwLock::new(Vec::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Insert or replace the entry for the metadata's identity.
    ///
    /// Never fails for valid input. On replacement the previous and new
    /// descriptions are named in a `warn!` so colliding declarations are
    /// visible in startup logs.
    pub fn register(&self, metadata: HandlerMetadata, instance: Arc<dyn Handler>) {
        let identity = metadata.identity().clone();

        if self.sealed.load(Ordering::Acquire) {
            warn!(%identity, "registration after discovery completed; entry accepted but the startup sequence should prevent this");
        }

        let entry = RegistryEntry {
            metadata: Arc::new(metadata),
            instance,
        };
        let replacement = entry.metadata().describe();

        match self.entries.insert(identity.clone(), entry) {
            Some(previous) => {
                warn!(
                    %identity,
                    previous = %previous.metadata().describe(),
                    %replacement,
                    "handler identity registered twice; last registration wins"
                );
            }
            None => self.order.write().push(identity),
        }
    }

    /// Exact-match lookup. No partial or fuzzy matching for any kind.
    #[must_use]
    pub fn lookup(&self, identity: &HandlerIdentity) -> Option<RegistryEntry> {
        self.entries.get(identity).map(|e| e.value().clone())
    }

    /// All entries of one transport kind, in registration order.
    #[must_use]
    pub fn list_all(&self, kind: TransportKind) -> Vec<RegistryEntry> {
        self.order
            .read()
            .iter()
            .filter(|identity| identity.kind() == kind)
            .filter_map(|identity| self.lookup(identity))
            .collect()
    }

    /// Marks the discovery phase as finished. Reads-only from here on.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    /// Handler that reports a fixed tag so tests can tell instances apart.
    struct TaggedHandler {
        tag: &'static str,
        calls: AtomicU32,
    }

    impl TaggedHandler {
        fn new(tag: &'static str) -> Arc<Self> {
            Arc::new(Self {
                tag,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Handler for TaggedHandler {
        async fn handle(&self, _ctx: InvocationContext) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::String(self.tag.to_string()))
        }
    }

    fn meta(identity: HandlerIdentity, description: &str) -> HandlerMetadata {
        HandlerMetadata::new(identity).with_description(description)
    }

    #[test]
    fn register_and_lookup_exact_match() {
        let registry = HandlerRegistry::new();
        let id = HandlerIdentity::http("GET", "/screen/test").unwrap();
        registry.register(meta(id.clone(), "screen"), TaggedHandler::new("a"));

        assert!(registry.lookup(&id).is_some());
        let other = HandlerIdentity::http("GET", "/screen/other").unwrap();
        assert!(registry.lookup(&other).is_none());
    }

    #[test]
    fn trailing_slash_lookup_matches() {
        let registry = HandlerRegistry::new();
        registry.register(
            meta(HandlerIdentity::http("GET", "/users").unwrap(), "users"),
            TaggedHandler::new("a"),
        );

        let slashed = HandlerIdentity::http("GET", "/users/").unwrap();
        assert!(registry.lookup(&slashed).is_some());
    }

    #[tokio::test]
    async fn overwrite_keeps_exactly_one_entry_and_the_second_instance() {
        let registry = HandlerRegistry::new();
        let id = HandlerIdentity::worker("email").unwrap();
        registry.register(meta(id.clone(), "first"), TaggedHandler::new("first"));
        registry.register(meta(id.clone(), "second"), TaggedHandler::new("second"));

        assert_eq!(registry.len(), 1);

        let entry = registry.lookup(&id).unwrap();
        assert_eq!(entry.metadata().describe(), "second");

        let ctx = InvocationContext::Worker {
            queue: "email".to_string(),
            payload: Value::Null,
            job: crate::context::JobInfo {
                job_id: "j-1".to_string(),
                attempt: 1,
            },
        };
        let out = entry.instance().handle(ctx).await.unwrap();
        assert_eq!(out, Value::String("second".to_string()));
    }

    #[test]
    fn list_all_shows_one_entry_after_double_registration() {
        let registry = HandlerRegistry::new();
        let id = HandlerIdentity::worker("email").unwrap();
        registry.register(meta(id.clone(), "first"), TaggedHandler::new("first"));
        registry.register(meta(id, "second"), TaggedHandler::new("second"));

        let workers = registry.list_all(TransportKind::Worker);
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].metadata().describe(), "second");
    }

    #[test]
    fn list_all_preserves_registration_order_per_kind() {
        let registry = HandlerRegistry::new();
        registry.register(
            meta(HandlerIdentity::topic("b.second").unwrap(), "b"),
            TaggedHandler::new("b"),
        );
        registry.register(
            meta(HandlerIdentity::worker("email").unwrap(), "w"),
            TaggedHandler::new("w"),
        );
        registry.register(
            meta(HandlerIdentity::topic("a.first").unwrap(), "a"),
            TaggedHandler::new("a"),
        );

        let topics: Vec<String> = registry
            .list_all(TransportKind::Topic)
            .iter()
            .map(|e| e.metadata().describe())
            .collect();
        // Insertion order, not sorted.
        assert_eq!(topics, vec!["b", "a"]);
    }

    #[test]
    fn seal_flips_once() {
        let registry = HandlerRegistry::new();
        assert!(!registry.is_sealed());
        registry.seal();
        assert!(registry.is_sealed());

        // Late registration still lands (non-fatal) but is logged.
        registry.register(
            meta(HandlerIdentity::topic("late").unwrap(), "late"),
            TaggedHandler::new("late"),
        );
        assert_eq!(registry.len(), 1);
    }
}
