//! Handler metadata captured at tagging time.
//!
//! Metadata is immutable after registration; the builder methods exist so a
//! handler-definition unit can attach its access policy and description
//! before the registry ever sees the entry.

use serde::{Deserialize, Serialize};

use crate::identity::{HandlerIdentity, TransportKind};

/// Required-authorization marker for a handler.
///
/// Recorded at tagging time and exposed to adapters; enforcement is the
/// adapter's concern, not the dispatch core's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    /// No authorization required.
    Public,
    /// Caller must hold the named role.
    RequiresRole(String),
}

/// Attributes captured when a handler is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerMetadata {
    identity: HandlerIdentity,
    access: AccessPolicy,
    description: Option<String>,
}

impl HandlerMetadata {
    /// Metadata for a public handler with no description.
    #[must_use]
    pub fn new(identity: HandlerIdentity) -> Self {
        Self {
            identity,
            access: AccessPolicy::Public,
            description: None,
        }
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the access policy.
    #[must_use]
    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.identity.kind()
    }

    #[must_use]
    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// Description if one was declared, otherwise the identity rendered as
    /// text. Used by startup logging and overwrite warnings.
    #[must_use]
    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.identity.to_string())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_description_and_access() {
        let meta = HandlerMetadata::new(HandlerIdentity::topic("user.created").unwrap())
            .with_description("fan out welcome email")
            .with_access(AccessPolicy::RequiresRole("admin".to_string()));

        assert_eq!(meta.describe(), "fan out welcome email");
        assert_eq!(
            meta.access(),
            &AccessPolicy::RequiresRole("admin".to_string())
        );
        assert_eq!(meta.kind(), TransportKind::Topic);
    }

    #[test]
    fn describe_falls_back_to_identity() {
        let meta = HandlerMetadata::new(HandlerIdentity::worker("email").unwrap());
        assert_eq!(meta.describe(), "worker email");
        assert!(meta.description().is_none());
    }
}
