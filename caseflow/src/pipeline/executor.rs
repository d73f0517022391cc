//! Sequential pipeline execution.

use super::{PipelineDefinition, ProgressObserver};
use crate::agents::{AgentDescriptor, ModelClient};
use crate::cancellation::CancellationToken;
use crate::context::{ExecutionContext, RequestParameters};
use crate::errors::{CaseflowError, ModelError};
use crate::events::{types, EventSink, NoOpEventSink};
use crate::report::{Report, ResultFormatter};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default bound on a single model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs a pipeline's agents one after another.
///
/// Agent k+1 starts only after agent k's output is in the context. The
/// first failure stops the run; nothing after it is called.
#[derive(Clone)]
pub struct SequentialExecutor {
    model: Arc<dyn ModelClient>,
    formatter: ResultFormatter,
    events: Arc<dyn EventSink>,
    model_timeout: Duration,
}

impl std::fmt::Debug for SequentialExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialExecutor")
            .field("formatter", &self.formatter)
            .field("model_timeout", &self.model_timeout)
            .finish_non_exhaustive()
    }
}

impl SequentialExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(model: Arc<dyn ModelClient>, formatter: ResultFormatter) -> Self {
        Self {
            model,
            formatter,
            events: Arc::new(NoOpEventSink),
            model_timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn model_timeout(&self) -> Duration {
        self.model_timeout
    }

    /// Returns the formatter.
    #[must_use]
    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }

    /// Executes `pipeline` against `ctx` and formats the report.
    ///
    /// # Errors
    ///
    /// Returns the first failure: a missing input, a render error, a model
    /// error or timeout, cancellation, or an invalid projection.
    pub async fn execute(
        &self,
        session_id: Uuid,
        pipeline: &PipelineDefinition,
        request: &RequestParameters,
        mut ctx: ExecutionContext,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<Report, CaseflowError> {
        let start = Instant::now();
        info!(
            session_id = %session_id,
            pipeline = pipeline.name(),
            agents = pipeline.len(),
            "Starting pipeline run"
        );
        self.events.try_emit(
            types::PIPELINE_STARTED,
            Some(json!({
                "session_id": session_id,
                "pipeline": pipeline.name(),
                "total_agents": pipeline.len(),
            })),
        );
        observer.on_run_started(pipeline.len());

        if let Err(missing) = pipeline.check_inputs(&ctx) {
            return Err(self.fail_run(session_id, None, missing.into()));
        }

        for (index, agent) in pipeline.agents().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancel_run(session_id, Some(agent), cancel));
            }

            observer.on_agent_started(index, agent);
            match self.run_agent(session_id, index, agent, &ctx, cancel).await {
                Ok(output) => {
                    if let Err(conflict) = ctx.insert(agent.output_key(), output.as_str()) {
                        let err = CaseflowError::from(conflict);
                        observer.on_agent_failed(index, agent, &err);
                        return Err(self.fail_run(session_id, Some(agent), err));
                    }
                    observer.on_agent_completed(index, agent, &output);
                }
                Err(CaseflowError::Cancelled(_)) => {
                    return Err(self.cancel_run(session_id, Some(agent), cancel));
                }
                Err(err) => {
                    observer.on_agent_failed(index, agent, &err);
                    return Err(self.fail_run(session_id, Some(agent), err));
                }
            }
        }

        let report = self
            .formatter
            .format(pipeline, &ctx, request)
            .map_err(|e| self.fail_run(session_id, None, e.into()))?;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(session_id = %session_id, duration_ms, "Pipeline run completed");
        self.events.try_emit(
            types::PIPELINE_COMPLETED,
            Some(json!({
                "session_id": session_id,
                "pipeline": pipeline.name(),
                "duration_ms": duration_ms,
            })),
        );
        Ok(report)
    }

    async fn run_agent(
        &self,
        session_id: Uuid,
        index: usize,
        agent: &AgentDescriptor,
        ctx: &ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<String, CaseflowError> {
        let instruction = agent.instruction().render(ctx)?;

        debug!(
            session_id = %session_id,
            agent = agent.name(),
            index,
            chars = instruction.len(),
            "Calling model"
        );
        self.events.try_emit(
            types::AGENT_STARTED,
            Some(json!({
                "session_id": session_id,
                "agent": agent.name(),
                "index": index,
            })),
        );

        let agent_start = Instant::now();
        let call = tokio::time::timeout(
            self.model_timeout,
            self.model.call(agent.model_id(), &instruction),
        );

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(CaseflowError::Cancelled(cancel.reason().unwrap_or_default()));
            }
            result = call => match result {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => return Err(CaseflowError::agent(agent.name(), e)),
                Err(_) => {
                    return Err(CaseflowError::agent(
                        agent.name(),
                        ModelError::Timeout(self.model_timeout),
                    ))
                }
            },
        };

        let duration_ms = agent_start.elapsed().as_secs_f64() * 1000.0;
        info!(
            session_id = %session_id,
            agent = agent.name(),
            output_key = agent.output_key(),
            duration_ms,
            "Agent completed"
        );
        self.events.try_emit(
            types::AGENT_COMPLETED,
            Some(json!({
                "session_id": session_id,
                "agent": agent.name(),
                "index": index,
                "output_key": agent.output_key(),
                "duration_ms": duration_ms,
            })),
        );
        Ok(output)
    }

    fn fail_run(
        &self,
        session_id: Uuid,
        agent: Option<&AgentDescriptor>,
        err: CaseflowError,
    ) -> CaseflowError {
        let agent_name = agent.map(AgentDescriptor::name);
        warn!(
            session_id = %session_id,
            agent = agent_name.unwrap_or("-"),
            kind = err.kind(),
            error = %err,
            "Pipeline run failed"
        );
        if let Some(name) = agent_name {
            self.events.try_emit(
                types::AGENT_FAILED,
                Some(json!({
                    "session_id": session_id,
                    "agent": name,
                    "error": err.to_string(),
                    "kind": err.kind(),
                })),
            );
        }
        self.events.try_emit(
            types::PIPELINE_FAILED,
            Some(json!({
                "session_id": session_id,
                "agent": agent_name,
                "error": err.to_string(),
            })),
        );
        err
    }

    fn cancel_run(
        &self,
        session_id: Uuid,
        agent: Option<&AgentDescriptor>,
        cancel: &CancellationToken,
    ) -> CaseflowError {
        let reason = cancel
            .reason()
            .unwrap_or_else(|| "Cancellation requested".to_string());
        info!(session_id = %session_id, reason = %reason, "Pipeline run cancelled");
        self.events.try_emit(
            types::PIPELINE_CANCELLED,
            Some(json!({
                "session_id": session_id,
                "agent": agent.map(AgentDescriptor::name),
                "reason": &reason,
            })),
        );
        CaseflowError::Cancelled(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::MockModelClient;
    use crate::context::sample_request;
    use crate::events::CollectingEventSink;
    use crate::pipeline::{NoopObserver, PipelineBuilder};
    use crate::testing::{RecordingObserver, ScriptedModelClient};
    use mockall::Sequence;

    fn abc_pipeline() -> PipelineDefinition {
        PipelineBuilder::new("abc")
            .request_inputs()
            .agent(AgentDescriptor::new("A", "m", "A: {business_scenario}", "x"))
            .agent(AgentDescriptor::new("B", "m", "B: {x}", "y"))
            .agent(AgentDescriptor::new("C", "m", "C: {x} / {y}", "z"))
            .build()
            .unwrap()
    }

    fn executor(model: Arc<dyn ModelClient>) -> SequentialExecutor {
        SequentialExecutor::new(model, ResultFormatter::default())
    }

    async fn run(
        executor: &SequentialExecutor,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<Report, CaseflowError> {
        let request = sample_request();
        executor
            .execute(
                Uuid::new_v4(),
                &abc_pipeline(),
                &request,
                request.to_context(),
                observer,
                cancel,
            )
            .await
    }

    #[tokio::test]
    async fn test_failure_halts_pipeline() {
        let mut mock = MockModelClient::new();
        let mut seq = Sequence::new();
        mock.expect_call()
            .withf(|_, instruction| instruction.starts_with("A:"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("foo".to_string()));
        mock.expect_call()
            .withf(|_, instruction| instruction.starts_with("B:") && instruction.contains("foo"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ModelError::Request("boom".to_string())));
        mock.expect_call()
            .withf(|_, instruction| instruction.starts_with("C:"))
            .times(0);

        let observer = RecordingObserver::new();
        let err = run(&executor(Arc::new(mock)), &observer, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CaseflowError::Agent { ref agent, .. } if agent == "B"));
        assert_eq!(observer.completed(), vec!["A".to_string()]);
        assert_eq!(observer.started(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(observer.failed(), Some("B".to_string()));
    }

    #[tokio::test]
    async fn test_agents_run_in_order_with_substitution() {
        let model = Arc::new(
            ScriptedModelClient::new()
                .with_response("foo")
                .with_response("bar")
                .with_response("baz"),
        );
        let report = run(&executor(model.clone()), &NoopObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            model.instructions(),
            vec![
                "A: Accounts payable automation".to_string(),
                "B: foo".to_string(),
                "C: foo / bar".to_string(),
            ]
        );
        let keys: Vec<&str> = report.sections.iter().map(|s| s.output_key.as_str()).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        assert_eq!(report.section("z").unwrap().content, "baz");
    }

    fn chain_pipeline() -> PipelineDefinition {
        PipelineBuilder::new("chain")
            .request_inputs()
            .agent(AgentDescriptor::new("A", "m", "A: {business_scenario}", "o0"))
            .agent(AgentDescriptor::new("B", "m", "B: {o0}", "o1"))
            .agent(AgentDescriptor::new("C", "m", "C: {business_scenario}", "o2"))
            .agent(AgentDescriptor::new("D", "m", "D: {o0} {o1} {o2}", "o3"))
            .agent(AgentDescriptor::new("E", "m", "E: {o0} {o1} {o2} {o3}", "o4"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_context_grows_by_one_output_per_agent() {
        let responses: Vec<String> = (0..5).map(|i| format!("resp-{i}")).collect();
        let model = Arc::new(
            responses
                .iter()
                .fold(ScriptedModelClient::new(), |m, r| m.with_response(r.as_str())),
        );
        let observer = RecordingObserver::new();
        let request = sample_request();

        let report = executor(model.clone())
            .execute(
                Uuid::new_v4(),
                &chain_pipeline(),
                &request,
                request.to_context(),
                &observer,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let instructions = model.instructions();
        assert_eq!(
            instructions,
            vec![
                "A: Accounts payable automation".to_string(),
                "B: resp-0".to_string(),
                "C: Accounts payable automation".to_string(),
                "D: resp-0 resp-1 resp-2".to_string(),
                "E: resp-0 resp-1 resp-2 resp-3".to_string(),
            ]
        );

        // D and E reference every earlier output: they see exactly outputs 0..k.
        for k in [3, 4] {
            for (j, response) in responses.iter().enumerate() {
                assert_eq!(
                    instructions[k].contains(response.as_str()),
                    j < k,
                    "agent {k} visibility of output {j}"
                );
            }
        }

        assert_eq!(observer.completed(), vec!["A", "B", "C", "D", "E"]);
        let keys: Vec<&str> = report.sections.iter().map(|s| s.output_key.as_str()).collect();
        assert_eq!(keys, vec!["o0", "o1", "o2", "o3", "o4"]);
        let contents: Vec<&str> = report.sections.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, responses.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_context_order_is_request_fields_then_outputs() {
        let mut ctx = sample_request().to_context();
        for (key, value) in [("o0", "resp-0"), ("o1", "resp-1")] {
            ctx.insert(key, value).unwrap();
        }

        let keys: Vec<&str> = ctx.keys().collect();
        let mut expected: Vec<&str> = RequestParameters::VARIABLES.to_vec();
        expected.extend(["o0", "o1"]);
        assert_eq!(keys, expected);
        assert_eq!(ctx.last_key(), Some("o1"));
    }

    #[tokio::test]
    async fn test_deterministic_runs_produce_identical_reports() {
        let first = run(
            &executor(Arc::new(ScriptedModelClient::new())),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        let second = run(
            &executor(Arc::new(ScriptedModelClient::new())),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_timeout_is_a_model_failure() {
        let model = Arc::new(ScriptedModelClient::new().with_delay(Duration::from_millis(500)));
        let executor = executor(model.clone()).with_model_timeout(Duration::from_millis(20));

        let observer = RecordingObserver::new();
        let err = run(&executor, &observer, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CaseflowError::Agent { source: ModelError::Timeout(_), .. }
        ));
        assert_eq!(err.kind(), "model_timeout");
        assert_eq!(observer.failed(), Some("A".to_string()));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let model = Arc::new(ScriptedModelClient::new());
        let cancel = CancellationToken::new();
        cancel.cancel("client request");

        let err = run(&executor(model.clone()), &NoopObserver, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CaseflowError::Cancelled(ref reason) if reason == "client request"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight_call() {
        let model = Arc::new(ScriptedModelClient::new().with_delay(Duration::from_secs(5)));
        let executor = executor(model.clone());
        let cancel = Arc::new(CancellationToken::new());

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel("stop");
            })
        };

        let err = tokio::time::timeout(
            Duration::from_secs(2),
            run(&executor, &NoopObserver, &cancel),
        )
        .await
        .expect("cancellation should interrupt the call")
        .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, CaseflowError::Cancelled(_)));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_any_call() {
        let model = Arc::new(ScriptedModelClient::new());
        let err = executor(model.clone())
            .execute(
                Uuid::new_v4(),
                &abc_pipeline(),
                &sample_request(),
                ExecutionContext::new(),
                &NoopObserver,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CaseflowError::MissingContextVariable(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let executor = executor(Arc::new(ScriptedModelClient::new())).with_event_sink(sink.clone());

        run(&executor, &NoopObserver, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "agent.started",
                "agent.completed",
                "agent.started",
                "agent.completed",
                "agent.started",
                "agent.completed",
                "pipeline.completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let model = ScriptedModelClient::new()
            .with_response("foo")
            .with_error(ModelError::EmptyResponse);
        let executor = executor(Arc::new(model)).with_event_sink(sink.clone());

        let _ = run(&executor, &NoopObserver, &CancellationToken::new()).await;

        let types = sink.event_types();
        assert_eq!(&types[types.len() - 2..], &["agent.failed", "pipeline.failed"]);
        let (_, data) = &sink.events_of_type("agent.failed")[0];
        assert_eq!(data.as_ref().unwrap()["agent"], "B");
    }
}
