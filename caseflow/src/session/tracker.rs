//! Session lifecycle: admission, background execution, polling.

use super::{ContextLookup, SessionRecord, SessionSnapshot, SessionStore};
use crate::agents::{AgentDescriptor, AgentInfo};
use crate::cancellation::CancellationToken;
use crate::context::RequestParameters;
use crate::errors::CaseflowError;
use crate::pipeline::{PipelineDefinition, ProgressObserver, SequentialExecutor};
use crate::report::{Projection, Refiner, Report, ResultFormatter};
use crate::tools::KeywordScreen;
use crate::utils::now_utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// How sessions produce their report.
#[derive(Debug, Clone)]
pub enum ExecutionMode {
    /// Run the agent pipeline.
    Agents {
        /// The executor.
        executor: SequentialExecutor,
        /// The validated pipeline.
        pipeline: Arc<PipelineDefinition>,
    },
    /// Synthesise the report from the request alone.
    Fallback {
        /// The formatter.
        formatter: ResultFormatter,
    },
}

impl ExecutionMode {
    /// Returns `agents` or `fallback`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Agents { .. } => "agents",
            Self::Fallback { .. } => "fallback",
        }
    }

    /// Returns the formatter that builds the final report.
    #[must_use]
    pub fn formatter(&self) -> &ResultFormatter {
        match self {
            Self::Agents { executor, .. } => executor.formatter(),
            Self::Fallback { formatter } => formatter,
        }
    }
}

/// Admits requests, runs them in the background and answers polls.
pub struct SessionTracker {
    store: Arc<dyn SessionStore>,
    mode: ExecutionMode,
    screen: Option<KeywordScreen>,
    lookup: Option<ContextLookup>,
    refiner: Refiner,
    tokens: Arc<DashMap<Uuid, Arc<CancellationToken>>>,
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("mode", &self.mode.name())
            .field("sessions", &self.store.len())
            .field("running", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

impl SessionTracker {
    /// Creates a tracker.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, mode: ExecutionMode) -> Self {
        Self {
            store,
            mode,
            screen: None,
            lookup: None,
            refiner: Refiner::default(),
            tokens: Arc::new(DashMap::new()),
        }
    }

    /// Screens request text before admission.
    #[must_use]
    pub fn with_screen(mut self, screen: KeywordScreen) -> Self {
        self.screen = Some(screen);
        self
    }

    /// Injects a reference lookup into every run's context.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the lookup key collides with an agent output key.
    pub fn with_lookup(mut self, lookup: ContextLookup) -> Result<Self, CaseflowError> {
        if let ExecutionMode::Agents { pipeline, .. } = &self.mode {
            if pipeline
                .agents()
                .iter()
                .any(|a| a.output_key() == lookup.context_key())
            {
                return Err(CaseflowError::Config(format!(
                    "Lookup key '{}' collides with an agent output key",
                    lookup.context_key()
                )));
            }
        }
        self.lookup = Some(lookup);
        Ok(self)
    }

    /// Replaces the refiner.
    #[must_use]
    pub fn with_refiner(mut self, refiner: Refiner) -> Self {
        self.refiner = refiner;
        self
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Returns the pipeline in agents mode.
    #[must_use]
    pub fn pipeline(&self) -> Option<&PipelineDefinition> {
        match &self.mode {
            ExecutionMode::Agents { pipeline, .. } => Some(pipeline.as_ref()),
            ExecutionMode::Fallback { .. } => None,
        }
    }

    /// Describes the pipeline's agents; empty in fallback mode.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentInfo> {
        self.pipeline()
            .map(PipelineDefinition::describe)
            .unwrap_or_default()
    }

    /// Returns the number of agents each session runs.
    #[must_use]
    pub fn total_agents(&self) -> usize {
        self.pipeline().map_or(0, PipelineDefinition::len)
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Admits a request and starts it in the background.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid requests, `InvalidProjection`
    /// when the request's numbers cannot produce a report, and `Config`
    /// when no runtime is available.
    pub fn create(&self, request: RequestParameters) -> Result<Uuid, CaseflowError> {
        request.validate()?;
        Projection::compute(self.mode.formatter().config(), &request)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CaseflowError::Config(format!("No tokio runtime: {e}")))?;

        let warnings = self
            .screen
            .as_ref()
            .map(|screen| screen.screen(&request))
            .unwrap_or_default();

        let mut ctx = request.to_context();
        if let Some(lookup) = &self.lookup {
            lookup.apply(&mut ctx)?;
        }

        let session_id = Uuid::new_v4();
        self.store.create(SessionRecord::new(
            session_id,
            request.clone(),
            self.total_agents(),
            warnings.clone(),
        ))?;
        info!(
            session_id = %session_id,
            mode = self.mode.name(),
            warnings = warnings.len(),
            "Session created"
        );

        let store = self.store.clone();
        match &self.mode {
            ExecutionMode::Agents { executor, pipeline } => {
                let token = Arc::new(CancellationToken::new());
                self.tokens.insert(session_id, token.clone());
                let tokens = self.tokens.clone();
                let executor = executor.clone();
                let pipeline = pipeline.clone();

                runtime.spawn(async move {
                    store.update(&session_id, &mut |r| r.start());
                    let writer = SessionWriter {
                        store: store.clone(),
                        session_id,
                    };
                    let result = executor
                        .execute(session_id, &pipeline, &request, ctx, &writer, &token)
                        .await;
                    finish(store.as_ref(), session_id, result);
                    tokens.remove(&session_id);
                });
            }
            ExecutionMode::Fallback { formatter } => {
                let formatter = formatter.clone();
                runtime.spawn(async move {
                    store.update(&session_id, &mut |r| r.start());
                    let result = formatter.fallback(&request).map_err(CaseflowError::from);
                    finish(store.as_ref(), session_id, result);
                });
            }
        }

        Ok(session_id)
    }

    /// Returns a consistent snapshot of a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn get_status(&self, session_id: &Uuid) -> Result<SessionSnapshot, CaseflowError> {
        self.store
            .get(session_id)
            .map(|record| record.snapshot())
            .ok_or_else(|| CaseflowError::not_found(*session_id))
    }

    /// Requests cancellation of a session.
    ///
    /// Finished sessions are returned unchanged. A running session stops
    /// at its next checkpoint, or immediately if a model call is in flight.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn cancel(&self, session_id: &Uuid, reason: &str) -> Result<SessionSnapshot, CaseflowError> {
        let record = self
            .store
            .get(session_id)
            .ok_or_else(|| CaseflowError::not_found(*session_id))?;
        if record.status.is_terminal() {
            return Ok(record.snapshot());
        }

        let token = self.tokens.get(session_id).map(|t| t.value().clone());
        if let Some(token) = token {
            token.cancel(reason);
        } else {
            let message = CaseflowError::Cancelled(reason.to_string()).to_string();
            self.store.update(session_id, &mut |r| r.fail(message.as_str()));
        }
        info!(session_id = %session_id, reason, "Cancellation requested");
        self.get_status(session_id)
    }

    /// Applies feedback to a session's report.
    ///
    /// Refinements build on the latest refined report; the original result
    /// is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `InvalidRequest` when the
    /// session has no result yet.
    pub fn refine(&self, session_id: &Uuid, feedback: &str) -> Result<Report, CaseflowError> {
        let mut outcome: Option<Report> = None;
        let found = self.store.update(session_id, &mut |record| {
            let Some(base) = record.refined_result.as_ref().or(record.result.as_ref()) else {
                return;
            };
            let refined = self.refiner.refine(base, feedback);
            record.refined_result = Some(refined.clone());
            outcome = Some(refined);
        });

        if !found {
            return Err(CaseflowError::not_found(*session_id));
        }
        outcome.ok_or_else(|| {
            CaseflowError::InvalidRequest("No analysis result to refine".to_string())
        })
    }

    /// Removes finished sessions older than `older_than`; returns how many.
    pub fn purge_finished(&self, older_than: Duration) -> usize {
        let Ok(age) = chrono::Duration::from_std(older_than) else {
            return 0;
        };
        let cutoff = now_utc() - age;
        let removed = self.store.purge(&|record| {
            record.status.is_terminal() && record.completed_at.is_some_and(|done| done <= cutoff)
        });
        if removed > 0 {
            info!(removed, "Purged finished sessions");
        }
        removed
    }
}

fn finish(store: &dyn SessionStore, session_id: Uuid, result: Result<Report, CaseflowError>) {
    match result {
        Ok(report) => {
            store.update(&session_id, &mut |r| r.complete(report.clone()));
        }
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "Session failed");
            let message = err.to_string();
            store.update(&session_id, &mut |r| r.fail(message.as_str()));
        }
    }
}

/// Writes executor progress into the store.
struct SessionWriter {
    store: Arc<dyn SessionStore>,
    session_id: Uuid,
}

impl ProgressObserver for SessionWriter {
    fn on_agent_started(&self, index: usize, agent: &AgentDescriptor) {
        self.store
            .update(&self.session_id, &mut |r| r.agent_started(index, agent.name()));
    }

    fn on_agent_completed(&self, _index: usize, agent: &AgentDescriptor, _output: &str) {
        self.store
            .update(&self.session_id, &mut |r| r.agent_completed(agent.name()));
    }

    fn on_agent_failed(&self, _index: usize, agent: &AgentDescriptor, _error: &CaseflowError) {
        self.store
            .update(&self.session_id, &mut |r| r.agent_failed(agent.name()));
    }
}
