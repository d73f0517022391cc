//! Service configuration.
//!
//! Every field has a serde default so a partial file (or none at all)
//! yields a working setup. The server layers a TOML file and
//! `CASEFLOW__*` environment variables on top of these defaults.

use crate::errors::CaseflowError;
use crate::observability::LoggingConfig;
use crate::pipeline::presets::DEFAULT_MODEL_ID;
use crate::report::ProjectionConfig;
use crate::tools::DEFAULT_BANNED_WORDS;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaseflowConfig {
    /// HTTP listener and session retention.
    #[serde(default)]
    pub server: ServerConfig,
    /// Model backend.
    #[serde(default)]
    pub model: ModelConfig,
    /// Projection arithmetic.
    #[serde(default)]
    pub projection: ProjectionConfig,
    /// Request screening.
    #[serde(default)]
    pub screening: ScreeningConfig,
    /// Optional reference lookup.
    #[serde(default)]
    pub lookup: Option<LookupConfig>,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CaseflowConfig {
    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid value.
    pub fn validate(&self) -> Result<(), CaseflowError> {
        self.server.socket_addr()?;
        if self.model.timeout_secs == 0 {
            return Err(CaseflowError::Config(
                "model.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.model.model_id.trim().is_empty() {
            return Err(CaseflowError::Config("model.model_id must not be empty".to_string()));
        }
        if self.server.sweep_interval_secs == 0 {
            return Err(CaseflowError::Config(
                "server.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        let cost = &self.projection.cost;
        if cost.min_cost > cost.max_cost {
            return Err(CaseflowError::Config(format!(
                "projection.cost.min_cost ({}) exceeds max_cost ({})",
                cost.min_cost, cost.max_cost
            )));
        }
        if let Some(lookup) = &self.lookup {
            if lookup.context_key.trim().is_empty() {
                return Err(CaseflowError::Config(
                    "lookup.context_key must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Returns true when runs should use the model pipeline.
    #[must_use]
    pub fn use_agents(&self) -> bool {
        !self.model.force_fallback && self.model.api_key().is_some()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, `host:port`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Origins echoed back in CORS responses.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Finished sessions older than this are purged.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// How often the purge runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl ServerConfig {
    /// Parses `bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, CaseflowError> {
        self.bind_addr
            .parse()
            .map_err(|e| CaseflowError::Config(format!("Invalid bind_addr '{}': {e}", self.bind_addr)))
    }

    /// Session retention.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Purge interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Returns true if `origin` may receive CORS headers.
    #[must_use]
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == "*" || o == origin)
    }
}

/// Model backend settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key. Without one the service runs in fallback mode.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for the API root.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used by every agent.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Per-call timeout.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
    /// Always use the fallback calculator.
    #[serde(default)]
    pub force_fallback: bool,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_model_timeout() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model_id: default_model_id(),
            timeout_secs: default_model_timeout(),
            force_fallback: false,
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("force_fallback", &self.force_fallback)
            .finish()
    }
}

impl ModelConfig {
    /// Returns the key if set and non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Keyword screening settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Whether requests are screened at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Words that produce a warning.
    #[serde(default = "default_banned_words")]
    pub banned_words: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_banned_words() -> Vec<String> {
    DEFAULT_BANNED_WORDS.iter().map(|w| (*w).to_string()).collect()
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            banned_words: default_banned_words(),
        }
    }
}

/// Reference catalog lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// JSON catalog file.
    pub catalog_path: PathBuf,
    /// Request field matched against the catalog.
    #[serde(default = "default_source_field")]
    pub source_field: String,
    /// Context key the match is published under.
    #[serde(default = "default_context_key")]
    pub context_key: String,
}

fn default_source_field() -> String {
    "business_scenario".to_string()
}

fn default_context_key() -> String {
    "reference".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LogFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: CaseflowConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CaseflowConfig::default());
        assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.model.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.model.timeout(), Duration::from_secs(120));
        assert!(config.screening.enabled);
        assert!(config.lookup.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: CaseflowConfig = serde_json::from_value(serde_json::json!({
            "server": { "bind_addr": "0.0.0.0:9000" },
            "model": { "api_key": "secret" },
            "logging": { "format": "json" },
            "lookup": { "catalog_path": "books.json" }
        }))
        .unwrap();

        assert_eq!(config.server.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.server.session_ttl(), Duration::from_secs(3600));
        assert_eq!(config.logging.format, LogFormat::Json);
        let lookup = config.lookup.unwrap();
        assert_eq!(lookup.source_field, "business_scenario");
        assert_eq!(lookup.context_key, "reference");
    }

    #[test]
    fn test_use_agents() {
        let mut config = CaseflowConfig::default();
        assert!(!config.use_agents());

        config.model.api_key = Some("   ".to_string());
        assert!(!config.use_agents());

        config.model.api_key = Some("key".to_string());
        assert!(config.use_agents());

        config.model.force_fallback = true;
        assert!(!config.use_agents());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CaseflowConfig::default();
        config.server.bind_addr = "nowhere".to_string();
        assert!(matches!(config.validate(), Err(CaseflowError::Config(_))));

        let mut config = CaseflowConfig::default();
        config.model.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = CaseflowConfig::default();
        config.projection.cost.min_cost = 600_000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allows_origin() {
        let mut server = ServerConfig::default();
        assert!(server.allows_origin("http://localhost:3000"));
        assert!(!server.allows_origin("http://evil.example"));

        server.allowed_origins = vec!["*".to_string()];
        assert!(server.allows_origin("http://evil.example"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let model = ModelConfig {
            api_key: Some("super-secret".to_string()),
            ..ModelConfig::default()
        };
        let debug = format!("{model:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
