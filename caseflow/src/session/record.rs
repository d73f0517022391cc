//! Session records and the snapshots clients poll.

use crate::context::RequestParameters;
use crate::report::Report;
use crate::utils::{elapsed_secs, now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a session: `pending -> running -> {complete, error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Allocated, run not yet started.
    Pending,
    /// Agents are executing.
    Running,
    /// The report is available.
    Complete,
    /// The run failed or was cancelled.
    Error,
}

impl SessionStatus {
    /// Returns true for `complete` and `error`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Returns the snake-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state of one analysis session.
///
/// While running, `current_agent_index == completed_agents.len()`.
/// Transition methods are no-ops once the session is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Session id.
    pub session_id: Uuid,
    /// Current status.
    pub status: SessionStatus,
    /// The submitted request.
    pub request: RequestParameters,
    /// Number of agents in the pipeline; 0 in fallback mode.
    pub total_agents: usize,
    /// Agents that finished, in order.
    pub completed_agents: Vec<String>,
    /// The agent currently running.
    pub current_agent: Option<String>,
    /// Index of the next agent to finish.
    pub current_agent_index: usize,
    /// The report, once complete.
    pub result: Option<Report>,
    /// The latest refinement of `result`.
    pub refined_result: Option<Report>,
    /// Failure message.
    pub error: Option<String>,
    /// The agent that failed, if any.
    pub failed_agent: Option<String>,
    /// Screening notes.
    pub warnings: Vec<String>,
    /// When the session was created.
    pub started_at: Timestamp,
    /// When the session became terminal.
    pub completed_at: Option<Timestamp>,
}

impl SessionRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn new(
        session_id: Uuid,
        request: RequestParameters,
        total_agents: usize,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            session_id,
            status: SessionStatus::Pending,
            request,
            total_agents,
            completed_agents: Vec::new(),
            current_agent: None,
            current_agent_index: 0,
            result: None,
            refined_result: None,
            error: None,
            failed_agent: None,
            warnings,
            started_at: now_utc(),
            completed_at: None,
        }
    }

    /// `pending -> running`.
    pub fn start(&mut self) {
        if self.status == SessionStatus::Pending {
            self.status = SessionStatus::Running;
        }
    }

    /// Marks `agent` as the one executing.
    pub fn agent_started(&mut self, index: usize, agent: &str) {
        if self.status.is_terminal() || index < self.current_agent_index {
            return;
        }
        self.status = SessionStatus::Running;
        self.current_agent = Some(agent.to_string());
    }

    /// Records that `agent` finished.
    pub fn agent_completed(&mut self, agent: &str) {
        if self.status.is_terminal() {
            return;
        }
        self.completed_agents.push(agent.to_string());
        self.current_agent_index = self.completed_agents.len();
    }

    /// Records which agent failed ahead of [`SessionRecord::fail`].
    pub fn agent_failed(&mut self, agent: &str) {
        if !self.status.is_terminal() {
            self.failed_agent = Some(agent.to_string());
        }
    }

    /// `running -> complete`.
    pub fn complete(&mut self, report: Report) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SessionStatus::Complete;
        self.current_agent = None;
        self.result = Some(report);
        self.completed_at = Some(now_utc());
    }

    /// `* -> error`.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SessionStatus::Error;
        self.error = Some(message.into());
        self.completed_at = Some(now_utc());
    }

    /// `floor(completed / total * 100)`; in fallback mode 100 once complete.
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        if self.total_agents == 0 {
            return if self.status == SessionStatus::Complete { 100 } else { 0 };
        }
        let pct = self.completed_agents.len().min(self.total_agents) * 100 / self.total_agents;
        u8::try_from(pct).unwrap_or(100)
    }

    /// Builds the client-facing view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            status: self.status,
            completed_agents: self.completed_agents.clone(),
            current_agent: self.current_agent.clone(),
            current_agent_index: self.current_agent_index,
            progress_percentage: self.progress_percentage(),
            total_agents: self.total_agents,
            result: self.result.clone(),
            refined_result: self.refined_result.clone(),
            error: self.error.clone(),
            failed_agent: self.failed_agent.clone(),
            warnings: self.warnings.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            processing_time_seconds: self
                .completed_at
                .map(|done| elapsed_secs(&self.started_at, &done)),
        }
    }
}

/// A consistent, read-only view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session id.
    pub session_id: Uuid,
    /// Current status.
    pub status: SessionStatus,
    /// Agents that finished, in order.
    pub completed_agents: Vec<String>,
    /// The agent currently running.
    pub current_agent: Option<String>,
    /// Index of the next agent to finish.
    pub current_agent_index: usize,
    /// Derived progress, 0..=100.
    pub progress_percentage: u8,
    /// Number of agents in the pipeline.
    pub total_agents: usize,
    /// The report, once complete.
    pub result: Option<Report>,
    /// The latest refinement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_result: Option<Report>,
    /// Failure message.
    pub error: Option<String>,
    /// The agent that failed.
    pub failed_agent: Option<String>,
    /// Screening notes.
    pub warnings: Vec<String>,
    /// Creation time.
    pub started_at: Timestamp,
    /// Completion time.
    pub completed_at: Option<Timestamp>,
    /// Seconds from creation to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ResultFormatter;
    use crate::testing::sample_request;

    fn record(total: usize) -> SessionRecord {
        SessionRecord::new(Uuid::new_v4(), sample_request(), total, Vec::new())
    }

    #[test]
    fn test_progress_floor() {
        let mut r = record(6);
        r.start();
        assert_eq!(r.progress_percentage(), 0);

        r.agent_started(0, "a");
        r.agent_completed("a");
        assert_eq!(r.progress_percentage(), 16);

        for (i, name) in ["b", "c", "d"].iter().enumerate() {
            r.agent_started(i + 1, name);
            r.agent_completed(name);
        }
        assert_eq!(r.progress_percentage(), 66);
        assert_eq!(r.current_agent_index, 4);
    }

    #[test]
    fn test_fallback_progress() {
        let mut r = record(0);
        assert_eq!(r.progress_percentage(), 0);
        r.start();
        r.complete(ResultFormatter::default().fallback(&sample_request()).unwrap());
        assert_eq!(r.progress_percentage(), 100);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut r = record(2);
        r.start();
        r.agent_started(0, "a");
        r.fail("boom");
        assert_eq!(r.status, SessionStatus::Error);

        r.agent_completed("a");
        r.complete(ResultFormatter::default().fallback(&sample_request()).unwrap());
        r.fail("again");

        assert_eq!(r.status, SessionStatus::Error);
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(r.completed_agents.is_empty());
        assert!(r.result.is_none());
    }

    #[test]
    fn test_snapshot_serializes_status_snake_case() {
        let mut r = record(3);
        r.start();
        r.agent_started(0, "a");

        let json = serde_json::to_value(r.snapshot()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["current_agent"], "a");
        assert_eq!(json["progress_percentage"], 0);
        assert!(json.get("refined_result").is_none());
        assert!(json["completed_at"].is_null());
    }

    #[test]
    fn test_status_helpers() {
        assert!(SessionStatus::Complete.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert_eq!(SessionStatus::Pending.to_string(), "pending");
    }
}
