//! Shared server state and its construction from configuration.

use anyhow::Context;
use caseflow::agents::GeminiClient;
use caseflow::config::{CaseflowConfig, LookupConfig, ServerConfig};
use caseflow::events::LoggingEventSink;
use caseflow::pipeline::{automation_business_case, SequentialExecutor};
use caseflow::report::ResultFormatter;
use caseflow::session::{ContextLookup, ExecutionMode, InMemorySessionStore, SessionTracker};
use caseflow::tools::{EntityCatalog, KeywordScreen};
use std::sync::Arc;
use tracing::{info, warn};

/// State shared by every connection.
#[derive(Debug)]
pub struct AppState {
    /// Session lifecycle.
    pub tracker: SessionTracker,
    /// Listener and CORS settings.
    pub server: ServerConfig,
}

impl AppState {
    /// Creates state around an existing tracker.
    #[must_use]
    pub fn new(tracker: SessionTracker, server: ServerConfig) -> Self {
        Self { tracker, server }
    }

    /// Wires the tracker described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the pipeline is invalid or the lookup catalog cannot be
    /// loaded.
    pub fn from_config(config: &CaseflowConfig) -> anyhow::Result<Self> {
        Ok(Self::new(build_tracker(config)?, config.server.clone()))
    }
}

fn build_mode(config: &CaseflowConfig) -> anyhow::Result<ExecutionMode> {
    let formatter = ResultFormatter::new(config.projection.clone());

    let api_key = match config.model.api_key() {
        Some(key) if config.use_agents() => key,
        _ => {
            warn!("No model key configured or fallback forced; reports use the calculator");
            return Ok(ExecutionMode::Fallback { formatter });
        }
    };

    let mut client = GeminiClient::new(api_key);
    if let Some(base_url) = &config.model.base_url {
        client = client.with_base_url(base_url.as_str());
    }

    let pipeline = automation_business_case(&config.model.model_id)
        .context("Built-in pipeline failed validation")?;
    let executor = SequentialExecutor::new(Arc::new(client), formatter)
        .with_event_sink(Arc::new(LoggingEventSink::info()))
        .with_model_timeout(config.model.timeout());

    info!(
        pipeline = pipeline.name(),
        agents = pipeline.len(),
        model = %config.model.model_id,
        "Agent pipeline ready"
    );
    Ok(ExecutionMode::Agents {
        executor,
        pipeline: Arc::new(pipeline),
    })
}

fn build_lookup(lookup: &LookupConfig) -> anyhow::Result<ContextLookup> {
    let catalog = EntityCatalog::load(&lookup.catalog_path)
        .with_context(|| format!("Failed to load catalog {}", lookup.catalog_path.display()))?;
    info!(
        path = %lookup.catalog_path.display(),
        entries = catalog.len(),
        "Reference catalog loaded"
    );
    Ok(ContextLookup::new(
        Arc::new(catalog),
        lookup.source_field.as_str(),
        lookup.context_key.as_str(),
    )?)
}

/// Builds a [`SessionTracker`] from configuration.
///
/// # Errors
///
/// Fails if the pipeline is invalid or the lookup cannot be built.
pub fn build_tracker(config: &CaseflowConfig) -> anyhow::Result<SessionTracker> {
    let mut tracker = SessionTracker::new(Arc::new(InMemorySessionStore::new()), build_mode(config)?);

    if config.screening.enabled {
        tracker = tracker.with_screen(KeywordScreen::new(&config.screening.banned_words));
    }
    if let Some(lookup) = &config.lookup {
        tracker = tracker.with_lookup(build_lookup(lookup)?)?;
    }
    Ok(tracker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_fallback_without_key() {
        let state = AppState::from_config(&CaseflowConfig::default()).unwrap();
        assert_eq!(state.tracker.mode().name(), "fallback");
        assert_eq!(state.tracker.total_agents(), 0);
    }

    #[test]
    fn test_agents_with_key() {
        let mut config = CaseflowConfig::default();
        config.model.api_key = Some("key".to_string());
        let tracker = build_tracker(&config).unwrap();
        assert_eq!(tracker.mode().name(), "agents");
        assert_eq!(tracker.total_agents(), 6);
    }

    #[test]
    fn test_force_fallback_wins() {
        let mut config = CaseflowConfig::default();
        config.model.api_key = Some("key".to_string());
        config.model.force_fallback = true;
        let tracker = build_tracker(&config).unwrap();
        assert_eq!(tracker.mode().name(), "fallback");
    }

    #[test]
    fn test_lookup_catalog_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"books": [{{"title": "The Goal", "author": "Eliyahu Goldratt"}}]}}"#)
            .unwrap();

        let mut config = CaseflowConfig::default();
        config.lookup = Some(LookupConfig {
            catalog_path: file.path().to_path_buf(),
            source_field: "business_scenario".to_string(),
            context_key: "reference".to_string(),
        });
        assert!(build_tracker(&config).is_ok());
    }

    #[test]
    fn test_missing_catalog_fails() {
        let mut config = CaseflowConfig::default();
        config.lookup = Some(LookupConfig {
            catalog_path: "/nonexistent/catalog.json".into(),
            source_field: "business_scenario".to_string(),
            context_key: "reference".to_string(),
        });
        assert!(build_tracker(&config).is_err());
    }
}
