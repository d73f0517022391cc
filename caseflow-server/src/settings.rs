//! Layered configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `CASEFLOW__SECTION__KEY` environment variables. The model key
//! also falls back to `GOOGLE_API_KEY`.

use anyhow::Context;
use caseflow::config::CaseflowConfig;
use config::{Config, Environment, File};
use std::path::Path;

/// Environment prefix for overrides.
pub const ENV_PREFIX: &str = "CASEFLOW";

/// Conventional name for the model key outside the prefixed namespace.
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

/// Default config file stem looked up in the working directory.
const DEFAULT_FILE: &str = "caseflow";

/// Loads configuration.
///
/// An explicit `path` must exist; otherwise `caseflow.toml` is read if
/// present.
///
/// # Errors
///
/// Fails if a source cannot be read or does not match the schema.
pub fn load(path: Option<&Path>) -> anyhow::Result<CaseflowConfig> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    let config: CaseflowConfig = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    Ok(with_api_key_fallback(
        config,
        std::env::var(GOOGLE_API_KEY).ok(),
    ))
}

/// Fills the model key from `fallback` when none was configured.
#[must_use]
pub fn with_api_key_fallback(mut config: CaseflowConfig, fallback: Option<String>) -> CaseflowConfig {
    if config.model.api_key().is_none() {
        if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
            config.model.api_key = Some(key);
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9100"
session_ttl_secs = 120

[model]
model_id = "gemini-1.5-pro"
force_fallback = true

[screening]
banned_words = ["outage"]

[projection.cost]
max_cost = 250000.0
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9100");
        assert_eq!(config.server.session_ttl_secs, 120);
        assert_eq!(config.server.sweep_interval_secs, 60);
        assert_eq!(config.model.model_id, "gemini-1.5-pro");
        assert!(config.model.force_fallback);
        assert_eq!(config.screening.banned_words, vec!["outage".to_string()]);
        assert!(config.screening.enabled);
        assert!((config.projection.cost.max_cost - 250_000.0).abs() < f64::EPSILON);
        assert!((config.projection.cost.base_cost - 75_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load(Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_file_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nsession_ttl_secs = \"soon\"").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn test_api_key_fallback() {
        let config = with_api_key_fallback(CaseflowConfig::default(), Some("from-env".into()));
        assert_eq!(config.model.api_key.as_deref(), Some("from-env"));

        let mut configured = CaseflowConfig::default();
        configured.model.api_key = Some("from-file".into());
        let config = with_api_key_fallback(configured, Some("from-env".into()));
        assert_eq!(config.model.api_key.as_deref(), Some("from-file"));

        let config = with_api_key_fallback(CaseflowConfig::default(), Some("  ".into()));
        assert!(config.model.api_key.is_none());
    }
}
