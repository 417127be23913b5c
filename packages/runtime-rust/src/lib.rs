//! Junction Runtime — dynamic handler registration and multi-transport
//! request resolution.
//!
//! The runtime reconciles three invocation models (synchronous HTTP
//! request/response, fire-and-forget topic events, retryable worker jobs)
//! behind one registration and dispatch abstraction:
//!
//! 1. **Tagging** (`tagging`): handler-definition units declare handlers
//!    into a pending-registration buffer
//! 2. **Discovery** (`discovery`): a startup sweep loads each unit and
//!    applies its tags to the registry, unit failures isolated
//! 3. **Registry** (`registry`): identity-keyed store, write-once at boot,
//!    concurrent-read afterwards
//! 4. **Resolver** (`resolver`): lookup, context construction, invocation,
//!    and envelope normalization per inbound event
//! 5. **Middleware** (`middleware`): tower layers for deadlines and tracing
//! 6. **Adapter surface** (`adapter`): per-transport failure dispositions

pub mod adapter;
pub mod config;
pub mod context;
pub mod discovery;
pub mod middleware;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod tagging;

// Re-export key types for convenient access.
pub use config::RuntimeConfig;
pub use context::{ConnectionHandle, InvocationContext, JobInfo};
pub use discovery::{DiscoveryConfig, DiscoveryError, DiscoveryReport, FailedUnit, HandlerUnit};
pub use middleware::{build_dispatch_pipeline, DeadlineLayer, TraceLayer};
pub use registry::{Handler, HandlerRegistry, RegistryEntry};
pub use resolver::{envelope_result, DispatchError, DispatchService, InboundEvent, Resolver};
pub use runtime::DispatchRuntime;
pub use tagging::TagBuffer;

// The shared vocabulary lives in junction-core.
pub use junction_core::{
    AccessPolicy, DispatchOutcome, ErrorEnvelope, ErrorKind, HandlerIdentity, HandlerMetadata,
    InvalidMetadataError, RoutingKey, TransportKind,
};
