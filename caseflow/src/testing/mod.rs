//! Testing utilities for caseflow pipelines and sessions.
//!
//! This module provides:
//! - A scripted model client and a recording progress observer
//! - Request fixtures and a session polling helper
//! - Assertions over session snapshots

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_progress_monotonic, assert_report_source, assert_session_status};
pub use fixtures::{sample_request, wait_until_finished};
pub use mocks::{RecordedCall, RecordingObserver, ScriptedModelClient};
