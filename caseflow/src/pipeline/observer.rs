//! Progress callbacks from the executor.

use crate::agents::AgentDescriptor;
use crate::errors::CaseflowError;

/// Receives per-agent progress from a run.
///
/// Callbacks are synchronous and must not block: the session tracker uses
/// them to update its record under a short write lock.
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first agent.
    fn on_run_started(&self, _total_agents: usize) {}

    /// Called before agent `index` renders its instruction.
    fn on_agent_started(&self, _index: usize, _agent: &AgentDescriptor) {}

    /// Called after agent `index`'s output is committed to the context.
    fn on_agent_completed(&self, _index: usize, _agent: &AgentDescriptor, _output: &str) {}

    /// Called when agent `index` fails. No later agent runs.
    fn on_agent_failed(&self, _index: usize, _agent: &AgentDescriptor, _error: &CaseflowError) {}
}

/// Ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
