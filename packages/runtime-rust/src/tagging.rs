//! Declaration-time metadata tagging.
//!
//! Handler-definition units never talk to the registry directly: each
//! `declare_*` call appends `(metadata, instance)` to a pending list owned
//! by the discovery sweep. The sweep applies the whole buffer only when the
//! unit loaded successfully, which is what makes unit loading all-or-nothing.
//!
//! Tagging performs no lookups and cannot fail except on malformed input
//! (empty method/path/topic/queue).

use std::sync::Arc;

use junction_core::{HandlerIdentity, HandlerMetadata, InvalidMetadataError};

use crate::registry::{Handler, HandlerRegistry};

/// One buffered declaration, not yet visible to the registry.
pub(crate) struct PendingRegistration {
    pub(crate) metadata: HandlerMetadata,
    pub(crate) instance: Arc<dyn Handler>,
}

/// Pending-registration list handed to a unit's loader.
#[derive(Default)]
pub struct TagBuffer {
    pending: Vec<PendingRegistration>,
}

impl TagBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an HTTP handler for `method` + `path`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError` if the method or path is empty.
    pub fn declare_http_handler<H: Handler>(
        &mut self,
        method: &str,
        path: &str,
        target: H,
    ) -> Result<(), InvalidMetadataError> {
        let identity = HandlerIdentity::http(method, path)?;
        self.declare(HandlerMetadata::new(identity), target);
        Ok(())
    }

    /// Declare a topic handler for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError::EmptyTopic` if the topic name is empty.
    pub fn declare_topic_handler<H: Handler>(
        &mut self,
        topic: &str,
        target: H,
    ) -> Result<(), InvalidMetadataError> {
        let identity = HandlerIdentity::topic(topic)?;
        self.declare(HandlerMetadata::new(identity), target);
        Ok(())
    }

    /// Declare a worker handler for `queue`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError::EmptyQueue` if the queue name is empty.
    pub fn declare_worker_handler<H: Handler>(
        &mut self,
        queue: &str,
        target: H,
    ) -> Result<(), InvalidMetadataError> {
        let identity = HandlerIdentity::worker(queue)?;
        self.declare(HandlerMetadata::new(identity), target);
        Ok(())
    }

    /// General form: declare with pre-built metadata, so a unit can attach
    /// an access policy or description before buffering.
    pub fn declare<H: Handler>(&mut self, metadata: HandlerMetadata, target: H) {
        self.pending.push(PendingRegistration {
            metadata,
            instance: Arc::new(target),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Flush every buffered declaration into the registry, in declaration
    /// order. Called by discovery after the unit's loader returned `Ok`.
    pub(crate) fn apply(self, registry: &HandlerRegistry) {
        for tag in self.pending {
            registry.register(tag.metadata, tag.instance);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use junction_core::TransportKind;
    use serde_json::Value;

    use super::*;
    use crate::context::InvocationContext;

    struct NullHandler;

    #[async_trait]
    impl Handler for NullHandler {
        async fn handle(&self, _ctx: InvocationContext) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn declarations_buffer_without_touching_the_registry() {
        let registry = HandlerRegistry::new();
        let mut buf = TagBuffer::new();
        buf.declare_http_handler("GET", "/users", NullHandler).unwrap();
        buf.declare_topic_handler("user.created", NullHandler).unwrap();
        buf.declare_worker_handler("email", NullHandler).unwrap();

        assert_eq!(buf.len(), 3);
        assert!(registry.is_empty());

        buf.apply(&registry);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.list_all(TransportKind::Http).len(), 1);
        assert_eq!(registry.list_all(TransportKind::Topic).len(), 1);
        assert_eq!(registry.list_all(TransportKind::Worker).len(), 1);
    }

    #[test]
    fn malformed_input_fails_only_that_declaration() {
        let mut buf = TagBuffer::new();
        assert_eq!(
            buf.declare_topic_handler("", NullHandler).unwrap_err(),
            InvalidMetadataError::EmptyTopic
        );
        buf.declare_topic_handler("user.created", NullHandler).unwrap();
        assert_eq!(buf.len(), 1);
    }
}
