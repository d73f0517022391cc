//! # Caseflow
//!
//! Sequential multi-agent business-case analysis.
//!
//! Caseflow runs a fixed chain of model-backed agents over a client's
//! request. Each agent renders an instruction template from the shared
//! execution context, calls the model, and publishes its output for the
//! agents after it. The final context becomes a structured [`report::Report`].
//! Without a model backend the same report is synthesised by a deterministic
//! calculator.
//!
//! Runs are tracked as sessions that clients poll by id:
//!
//! - **Pipelines**: validated agent chains with forward-reference checks
//! - **Sessions**: progress, cancellation, refinement and expiry
//! - **Reports**: ROI projection, roadmap and success metrics
//! - **Events**: lifecycle events through a pluggable [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use caseflow::prelude::*;
//!
//! let pipeline = automation_business_case(DEFAULT_MODEL_ID)?;
//! let executor = SequentialExecutor::new(model, ResultFormatter::default());
//! let tracker = SessionTracker::new(
//!     Arc::new(InMemorySessionStore::new()),
//!     ExecutionMode::Agents { executor, pipeline: Arc::new(pipeline) },
//! );
//!
//! let session_id = tracker.create(request)?;
//! let snapshot = tracker.get_status(&session_id)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod agents;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod template;
pub mod testing;
pub mod tools;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agents::{AgentDescriptor, AgentInfo, ModelClient};
    #[cfg(feature = "gemini")]
    pub use crate::agents::GeminiClient;
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::CaseflowConfig;
    pub use crate::context::{ExecutionContext, RequestParameters};
    pub use crate::errors::{
        CaseflowError, ContractErrorInfo, MissingContextVariable, ModelError,
        PipelineValidationError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::presets::DEFAULT_MODEL_ID;
    pub use crate::pipeline::{
        automation_business_case, PipelineBuilder, PipelineDefinition, ProgressObserver,
        SequentialExecutor,
    };
    pub use crate::report::{Report, ReportSource, ResultFormatter};
    pub use crate::session::{
        ExecutionMode, InMemorySessionStore, SessionSnapshot, SessionStatus, SessionStore,
        SessionTracker,
    };
    pub use crate::template::Template;
    pub use crate::utils::{iso_timestamp, Timestamp};
}
