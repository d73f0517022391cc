//! Global tracing subscriber setup.

use crate::errors::CaseflowError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = CaseflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CaseflowError::Config(format!("Unknown log format '{other}'"))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,caseflow=info,caseflow_server=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, CaseflowError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| CaseflowError::Config(format!("Invalid log filter '{}': {e}", config.filter))),
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Returns `Config` if the filter does not parse or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), CaseflowError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init(),
    };
    result.map_err(|e| CaseflowError::Config(format!("Failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_logging_config_defaults() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_invalid_filter() {
        let config = LoggingConfig {
            format: LogFormat::Pretty,
            filter: "caseflow=notalevel".to_string(),
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter(&config).is_err());
        }
    }
}
