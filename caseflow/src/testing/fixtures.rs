//! Shared fixtures.

use crate::context::RequestParameters;
use crate::session::{SessionSnapshot, SessionTracker};
use std::time::Duration;
use uuid::Uuid;

/// A valid request: 1000 transactions a month, 5 people, 85% manual.
#[must_use]
pub fn sample_request() -> RequestParameters {
    RequestParameters {
        business_challenge: "Invoice approvals take too long".to_string(),
        current_state: "Invoices are keyed in by hand and routed by email".to_string(),
        success_definition: "Approvals close within one day".to_string(),
        process_frequency: "daily".to_string(),
        monthly_volume: 1000,
        people_involved: 5,
        manual_percentage: 85,
        business_scenario: "Accounts payable automation".to_string(),
        decision_makers: vec!["CFO".to_string(), "Controller".to_string()],
        affected_departments: vec!["Finance".to_string()],
        business_context: String::new(),
        cx_objective: "Faster supplier payments".to_string(),
    }
}

/// Polls until the session is terminal and returns the final snapshot.
///
/// # Panics
///
/// Panics if the session is unknown or does not finish within 5 seconds.
pub async fn wait_until_finished(tracker: &SessionTracker, session_id: &Uuid) -> SessionSnapshot {
    let poll = async {
        loop {
            let snapshot = tracker
                .get_status(session_id)
                .unwrap_or_else(|e| panic!("session vanished: {e}"));
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .unwrap_or_else(|_| panic!("session {session_id} did not finish in time"))
}
