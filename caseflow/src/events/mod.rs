//! Lifecycle events for pipeline runs.
//!
//! The executor emits one event per lifecycle transition to an injected
//! [`EventSink`]. Payloads are JSON objects carrying at least the session id.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names.
pub mod types {
    /// A run was admitted and is about to start.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// An agent's instruction was rendered and the model call issued.
    pub const AGENT_STARTED: &str = "agent.started";
    /// An agent's output was published to the context.
    pub const AGENT_COMPLETED: &str = "agent.completed";
    /// An agent failed; the run stops.
    pub const AGENT_FAILED: &str = "agent.failed";
    /// The report was produced.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// The run ended in error.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// The run was cancelled.
    pub const PIPELINE_CANCELLED: &str = "pipeline.cancelled";
}
