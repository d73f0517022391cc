//! Assertions over session snapshots.

use crate::report::ReportSource;
use crate::session::{SessionSnapshot, SessionStatus};

/// Asserts that the session has the expected status.
pub fn assert_session_status(snapshot: &SessionSnapshot, expected: SessionStatus) {
    assert_eq!(
        snapshot.status, expected,
        "Expected status {:?}, got {:?} (error: {:?})",
        expected, snapshot.status, snapshot.error
    );
}

/// Asserts that the session completed with a report from `source`.
pub fn assert_report_source(snapshot: &SessionSnapshot, source: ReportSource) {
    assert_session_status(snapshot, SessionStatus::Complete);
    let actual = snapshot.result.as_ref().map(|r| r.source);
    assert_eq!(actual, Some(source), "Unexpected report source");
}

/// Asserts that a polled sequence never moves backwards.
pub fn assert_progress_monotonic(snapshots: &[SessionSnapshot]) {
    for pair in snapshots.windows(2) {
        assert!(
            pair[0].progress_percentage <= pair[1].progress_percentage,
            "Progress went backwards: {} -> {}",
            pair[0].progress_percentage,
            pair[1].progress_percentage
        );
        assert!(
            pair[1].completed_agents.starts_with(&pair[0].completed_agents),
            "Completed agents were rewritten: {:?} -> {:?}",
            pair[0].completed_agents,
            pair[1].completed_agents
        );
    }
}
