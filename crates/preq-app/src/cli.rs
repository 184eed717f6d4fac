//! CLI argument definitions for the runbook binary.
//!
//! Priority resolution: CLI args > env vars. There are no defaults for the
//! two input paths.

use clap::Parser;
use std::path::PathBuf;

/// Environment variable naming the runbook config file.
pub const RUNBOOK_ENV: &str = "PREQ_RUNBOOK";
/// Environment variable naming the detection report file.
pub const REPORT_ENV: &str = "PREQ_REPORT";

/// preq-runbook: run configured actions for every detected event.
#[derive(Parser, Debug)]
#[command(name = "preq-runbook", version, about)]
pub struct CliArgs {
    /// Path to the runbook YAML configuration.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the detection report (JSON array of event records).
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no {what} given; pass --{flag} or set {env}")]
    MissingPath {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },
}

impl CliArgs {
    /// Resolve the runbook config path.
    ///
    /// Priority: --config flag > PREQ_RUNBOOK env var.
    pub fn resolve_config_path(&self) -> Result<PathBuf, CliError> {
        resolve_path(self.config.as_ref(), std::env::var(RUNBOOK_ENV).ok())
            .ok_or(CliError::MissingPath {
                what: "runbook config",
                flag: "config",
                env: RUNBOOK_ENV,
            })
    }

    /// Resolve the detection report path.
    ///
    /// Priority: --report flag > PREQ_REPORT env var.
    pub fn resolve_report_path(&self) -> Result<PathBuf, CliError> {
        resolve_path(self.report.as_ref(), std::env::var(REPORT_ENV).ok())
            .ok_or(CliError::MissingPath {
                what: "detection report",
                flag: "report",
                env: REPORT_ENV,
            })
    }

    /// Log filter directive, `info` unless overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn resolve_path(flag: Option<&PathBuf>, env: Option<String>) -> Option<PathBuf> {
    if let Some(p) = flag {
        return Some(p.clone());
    }
    env.filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "preq-runbook",
            "--config",
            "runbook.yaml",
            "-r",
            "report.json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("runbook.yaml")));
        assert_eq!(args.report, Some(PathBuf::from("report.json")));
        assert_eq!(args.resolve_log_level().as_deref(), Some("debug"));
        assert_eq!(
            args.resolve_config_path().unwrap(),
            PathBuf::from("runbook.yaml")
        );
    }

    #[test]
    fn test_flag_beats_env() {
        let flag = PathBuf::from("flag.yaml");
        assert_eq!(
            resolve_path(Some(&flag), Some("env.yaml".into())),
            Some(flag)
        );
    }

    #[test]
    fn test_env_fallback() {
        assert_eq!(
            resolve_path(None, Some("env.yaml".into())),
            Some(PathBuf::from("env.yaml"))
        );
        assert_eq!(resolve_path(None, Some(String::new())), None);
        assert_eq!(resolve_path(None, None), None);
    }

    #[test]
    fn test_missing_path_message() {
        let err = CliError::MissingPath {
            what: "runbook config",
            flag: "config",
            env: RUNBOOK_ENV,
        };
        assert_eq!(
            err.to_string(),
            "no runbook config given; pass --config or set PREQ_RUNBOOK"
        );
    }
}
