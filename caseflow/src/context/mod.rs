//! Context management for pipeline execution.
//!
//! This module provides:
//! - The insert-only execution context agents read from and publish into
//! - The request parameters that seed it

mod execution;
mod request;

pub use execution::ExecutionContext;
pub use request::RequestParameters;

#[cfg(test)]
pub(crate) use crate::testing::sample_request;
