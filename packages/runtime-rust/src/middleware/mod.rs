//! Tower middleware around dispatch.
//!
//! - `deadline`: enforces the adapter-imposed (or default) deadline
//! - `trace`: wraps each dispatch in a tracing span with timing and outcome
//! - `pipeline`: composes the layers into one service stack

pub mod deadline;
pub mod pipeline;
pub mod trace;

pub use deadline::DeadlineLayer;
pub use pipeline::build_dispatch_pipeline;
pub use trace::TraceLayer;
