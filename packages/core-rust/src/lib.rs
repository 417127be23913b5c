//! Junction Core — transport kinds, handler identity, metadata, and the
//! uniform dispatch envelope shared between the runtime and its adapters.

pub mod envelope;
pub mod identity;
pub mod metadata;

pub use envelope::{DispatchOutcome, ErrorEnvelope, ErrorKind};
pub use identity::{HandlerIdentity, InvalidMetadataError, RoutingKey, TransportKind};
pub use metadata::{AccessPolicy, HandlerMetadata};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
