//! Pipeline definition, validation and sequential execution.
//!
//! This module provides:
//! - [`PipelineBuilder`] with build-time validation of placeholder references
//! - [`SequentialExecutor`] for running agents in order
//! - [`ProgressObserver`] callbacks for session tracking
//! - The built-in automation business-case pipeline

mod definition;
mod executor;
mod observer;
pub mod presets;

pub use definition::{PipelineBuilder, PipelineDefinition};
pub use executor::{SequentialExecutor, DEFAULT_MODEL_TIMEOUT};
pub use observer::{NoopObserver, ProgressObserver};
pub use presets::automation_business_case;
