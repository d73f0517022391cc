//! Test doubles for the model client and progress observer.

use crate::agents::{AgentDescriptor, ModelClient};
use crate::errors::{CaseflowError, ModelError};
use crate::pipeline::ProgressObserver;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// One recorded model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Model id passed by the executor.
    pub model_id: String,
    /// Rendered instruction.
    pub instruction: String,
}

/// A [`ModelClient`] that replays scripted responses in call order.
///
/// Once the script is exhausted it answers `response N` where N is the
/// 1-based call number, so unscripted runs stay deterministic.
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedModelClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    #[must_use]
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(text.into()));
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn with_error(self, error: ModelError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Delays every call, to exercise timeouts and cancellation.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns every call received.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the rendered instructions in call order.
    #[must_use]
    pub fn instructions(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| c.instruction.clone())
            .collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn call(&self, model_id: &str, instruction: &str) -> Result<String, ModelError> {
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                model_id: model_id.to_string(),
                instruction: instruction.to_string(),
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("response {call_number}")))
    }
}

/// A [`ProgressObserver`] that records agent names per callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    started: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    failed: Mutex<Option<String>>,
}

impl RecordingObserver {
    /// Creates an empty observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Agents that started, in order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    /// Agents that completed, in order.
    #[must_use]
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    /// The agent that failed, if any.
    #[must_use]
    pub fn failed(&self) -> Option<String> {
        self.failed.lock().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_agent_started(&self, _index: usize, agent: &AgentDescriptor) {
        self.started.lock().push(agent.name().to_string());
    }

    fn on_agent_completed(&self, _index: usize, agent: &AgentDescriptor, _output: &str) {
        self.completed.lock().push(agent.name().to_string());
    }

    fn on_agent_failed(&self, _index: usize, agent: &AgentDescriptor, _error: &CaseflowError) {
        *self.failed.lock() = Some(agent.name().to_string());
    }
}
