//! Handler identity: the `(transport kind, routing key)` pair that uniquely
//! names a registered handler.
//!
//! HTTP paths are normalized at construction (trailing slashes stripped) so
//! that registration and lookup always agree on the canonical form. Matching
//! is exact-literal per segment: `/users/:id` is a literal path, not a
//! pattern.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransportKind
// ---------------------------------------------------------------------------

/// The three invocation models the runtime dispatches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Synchronous request/response over an HTTP route.
    Http,
    /// Fire-and-forget publish/subscribe event.
    Topic,
    /// Asynchronous, retryable background job.
    Worker,
}

impl TransportKind {
    /// Stable lowercase name for logs and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::Topic => "topic",
            TransportKind::Worker => "worker",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InvalidMetadataError
// ---------------------------------------------------------------------------

/// Malformed tag input detected at declaration time.
///
/// Fatal to the one declaration that produced it; never aborts a discovery
/// sweep.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMetadataError {
    #[error("http handler declared with an empty method")]
    EmptyMethod,
    #[error("http handler declared with an empty path")]
    EmptyPath,
    #[error("topic handler declared with an empty topic name")]
    EmptyTopic,
    #[error("worker handler declared with an empty queue name")]
    EmptyQueue,
}

// ---------------------------------------------------------------------------
// RoutingKey
// ---------------------------------------------------------------------------

/// Transport-specific address distinguishing one handler from another within
/// the same transport kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingKey {
    /// HTTP method plus normalized literal path.
    Http { method: String, path: String },
    /// Publish/subscribe topic name.
    Topic { topic: String },
    /// Background job queue name.
    Worker { queue: String },
}

/// Strips trailing slashes so `/users/` and `/users` name the same route.
///
/// The root path `/` is preserved, and a path without a leading slash gets
/// one prepended so adapters cannot produce two spellings of the same route.
#[must_use]
pub fn normalize_http_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

// ---------------------------------------------------------------------------
// HandlerIdentity
// ---------------------------------------------------------------------------

/// Immutable key uniquely naming a registered handler.
///
/// Two identities are equal iff their transport kind and routing key match
/// exactly. Construction validates the routing key and canonicalizes it
/// (HTTP method uppercased, path normalized), so equality over the stored
/// form is the whole matching rule. Deserialization goes through the same
/// constructors, so a decoded identity is always canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HandlerIdentity {
    key: RoutingKey,
}

impl TryFrom<RoutingKey> for HandlerIdentity {
    type Error = InvalidMetadataError;

    fn try_from(key: RoutingKey) -> Result<Self, Self::Error> {
        match key {
            RoutingKey::Http { method, path } => Self::http(&method, &path),
            RoutingKey::Topic { topic } => Self::topic(&topic),
            RoutingKey::Worker { queue } => Self::worker(&queue),
        }
    }
}

impl<'de> Deserialize<'de> for HandlerIdentity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            key: RoutingKey,
        }

        let raw = Raw::deserialize(deserializer)?;
        HandlerIdentity::try_from(raw.key).map_err(serde::de::Error::custom)
    }
}

impl HandlerIdentity {
    /// Identity for an HTTP route.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError` if the method or path is empty
    /// (a path of only slashes counts as the root path, which is valid).
    pub fn http(method: &str, path: &str) -> Result<Self, InvalidMetadataError> {
        if method.trim().is_empty() {
            return Err(InvalidMetadataError::EmptyMethod);
        }
        if path.trim().is_empty() {
            return Err(InvalidMetadataError::EmptyPath);
        }
        Ok(Self {
            key: RoutingKey::Http {
                method: method.trim().to_ascii_uppercase(),
                path: normalize_http_path(path.trim()),
            },
        })
    }

    /// Identity for a pub/sub topic.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError::EmptyTopic` if the topic name is empty.
    pub fn topic(topic: &str) -> Result<Self, InvalidMetadataError> {
        if topic.trim().is_empty() {
            return Err(InvalidMetadataError::EmptyTopic);
        }
        Ok(Self {
            key: RoutingKey::Topic {
                topic: topic.trim().to_string(),
            },
        })
    }

    /// Identity for a worker queue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadataError::EmptyQueue` if the queue name is empty.
    pub fn worker(queue: &str) -> Result<Self, InvalidMetadataError> {
        if queue.trim().is_empty() {
            return Err(InvalidMetadataError::EmptyQueue);
        }
        Ok(Self {
            key: RoutingKey::Worker {
                queue: queue.trim().to_string(),
            },
        })
    }

    /// The transport this identity belongs to.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        match self.key {
            RoutingKey::Http { .. } => TransportKind::Http,
            RoutingKey::Topic { .. } => TransportKind::Topic,
            RoutingKey::Worker { .. } => TransportKind::Worker,
        }
    }

    /// The canonicalized routing key.
    #[must_use]
    pub fn routing_key(&self) -> &RoutingKey {
        &self.key
    }
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            RoutingKey::Http { method, path } => write!(f, "http {method} {path}"),
            RoutingKey::Topic { topic } => write!(f, "topic {topic}"),
            RoutingKey::Worker { queue } => write!(f, "worker {queue}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
