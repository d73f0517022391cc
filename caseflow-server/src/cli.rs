//! Command-line arguments.

use caseflow::config::CaseflowConfig;
use caseflow::observability::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Business case analysis service.
#[derive(Debug, Parser)]
#[command(name = "caseflow-server", version, about)]
pub struct Cli {
    /// TOML configuration file. Defaults to `caseflow.toml` if present.
    #[arg(short, long, env = "CASEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Always use the deterministic calculator instead of the model.
    #[arg(long)]
    pub fallback: bool,

    /// Log format: pretty or json.
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Applies flag overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut CaseflowConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind_addr.clone_from(bind);
        }
        if self.fallback {
            config.model.force_fallback = true;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "caseflow-server",
            "--bind",
            "0.0.0.0:8080",
            "--fallback",
            "--log-format",
            "json",
        ])
        .unwrap();

        let mut config = CaseflowConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert!(config.model.force_fallback);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["caseflow-server"]).unwrap();
        let mut config = CaseflowConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, CaseflowConfig::default());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["caseflow-server", "--log-format", "xml"]).is_err());
    }
}
