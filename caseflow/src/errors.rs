//! Error types for the caseflow pipeline.
//!
//! Every failure a caller can observe maps onto one variant of
//! [`CaseflowError`]. The narrower structs carry the detail that the status
//! endpoint and the logs need.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for caseflow operations.
#[derive(Debug, Error)]
pub enum CaseflowError {
    /// A pipeline definition failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A template referenced a variable that is not in the context.
    #[error("{0}")]
    MissingContextVariable(#[from] MissingContextVariable),

    /// An agent tried to publish a key that already exists in the context.
    #[error("{0}")]
    ContextConflict(#[from] ContextConflictError),

    /// The model-call collaborator failed for an agent.
    #[error("Agent '{agent}' failed: {source}")]
    Agent {
        /// The failing agent.
        agent: String,
        /// The underlying model error.
        #[source]
        source: ModelError,
    },

    /// The fallback arithmetic produced an unusable projection.
    #[error("{0}")]
    InvalidProjection(#[from] InvalidProjection),

    /// No session exists with the given id.
    #[error("Session not found: {session_id}")]
    NotFound {
        /// The unknown session id.
        session_id: Uuid,
    },

    /// The submitted request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The run was cancelled between or during agent calls.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// A lookup tool failed.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaseflowError {
    /// Wraps a model error with the agent it came from.
    #[must_use]
    pub fn agent(agent: impl Into<String>, source: ModelError) -> Self {
        Self::Agent {
            agent: agent.into(),
            source,
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(session_id: Uuid) -> Self {
        Self::NotFound { session_id }
    }

    /// Short machine-readable kind, used in API error bodies and events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "pipeline_validation",
            Self::MissingContextVariable(_) => "missing_context_variable",
            Self::ContextConflict(_) => "context_conflict",
            Self::Agent { source, .. } if source.is_timeout() => "model_timeout",
            Self::Agent { .. } => "model_error",
            Self::InvalidProjection(_) => "invalid_projection",
            Self::NotFound { .. } => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Cancelled(_) => "cancelled",
            Self::Tool(_) => "tool_error",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-004-FORWARD_REF").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline definition is rejected.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The agents involved in the error.
    pub agents: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agents: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the agents involved.
    #[must_use]
    pub fn with_agents(mut self, agents: Vec<String>) -> Self {
        self.agents = agents;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("agents".to_string(), serde_json::json!(self.agents));
        if let Some(ref info) = self.error_info {
            map.insert("code".to_string(), serde_json::json!(info.code));
            if let Some(ref hint) = info.fix_hint {
                map.insert("fix_hint".to_string(), serde_json::json!(hint));
            }
        }
        map
    }
}

/// A template placeholder could not be resolved against the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing context variable '{name}'")]
pub struct MissingContextVariable {
    /// The unresolved placeholder name.
    pub name: String,
}

impl MissingContextVariable {
    /// Creates a new missing variable error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Raised when writing a key that already exists in an execution context.
#[derive(Debug, Clone, Error)]
#[error("Context conflict: key '{key}' already exists")]
pub struct ContextConflictError {
    /// The conflicting key.
    pub key: String,
}

impl ContextConflictError {
    /// Creates a new context conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Errors raised by the model-call collaborator.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request could not be sent or the response could not be read.
    #[error("Model request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("Model backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the client.
        body: String,
    },

    /// The backend answered but produced no text.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The call exceeded the per-call timeout.
    #[error("Model call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ModelError {
    /// Returns true for timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The fallback arithmetic produced a non-finite or nonsensical result.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid projection: {reason}")]
pub struct InvalidProjection {
    /// Why the projection was rejected.
    pub reason: String,
}

impl InvalidProjection {
    /// Creates a new invalid projection error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors related to lookup tools.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The backing data file could not be read.
    #[error("Failed to load catalog '{path}': {reason}")]
    LoadFailed {
        /// The path that was read.
        path: String,
        /// The reason for failure.
        reason: String,
    },

    /// The data file does not have the expected shape.
    #[error("Malformed catalog '{path}': {reason}")]
    Malformed {
        /// The path that was read.
        path: String,
        /// What was wrong.
        reason: String,
    },
}

impl ToolError {
    /// Creates a load failure.
    #[must_use]
    pub fn load_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed data error.
    #[must_use]
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("agent", "roi_calculator");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.summary, "Test error");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
        assert_eq!(info.context.get("agent"), Some(&"roi_calculator".to_string()));
    }

    #[test]
    fn test_pipeline_validation_error_to_dict() {
        let err = PipelineValidationError::new("Bad pipeline")
            .with_agents(vec!["a".to_string(), "b".to_string()])
            .with_error_info(ContractErrorInfo::new("PIPELINE-001-EMPTY", "empty"));

        let dict = err.to_dict();
        assert_eq!(dict.get("message").unwrap(), "Bad pipeline");
        assert_eq!(dict.get("code").unwrap(), "PIPELINE-001-EMPTY");
        assert_eq!(err.code(), Some("PIPELINE-001-EMPTY"));
    }

    #[test]
    fn test_missing_variable_message_names_placeholder() {
        let err: CaseflowError = MissingContextVariable::new("roi_analysis").into();
        assert!(err.to_string().contains("roi_analysis"));
        assert_eq!(err.kind(), "missing_context_variable");
    }

    #[test]
    fn test_agent_error_kind_distinguishes_timeout() {
        let timeout = CaseflowError::agent("a", ModelError::Timeout(Duration::from_millis(250)));
        assert_eq!(timeout.kind(), "model_timeout");
        assert!(timeout.to_string().contains("250ms"));

        let failed = CaseflowError::agent("a", ModelError::EmptyResponse);
        assert_eq!(failed.kind(), "model_error");
        assert!(failed.to_string().starts_with("Agent 'a' failed"));
    }

    #[test]
    fn test_not_found_display() {
        let id = Uuid::nil();
        let err = CaseflowError::not_found(id);
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains(&id.to_string()));
    }
}
