//! preq-runbook binary - composition root.
//!
//! 1. Resolve the runbook and report paths
//! 2. Load the detection report
//! 3. Build the runbook and dispatch every event, cancelling on Ctrl-C

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use preq_core::{CoreError, EventRecord};
use preq_runbook::{runbook, DispatchContext, RunbookError};
use tokio_util::sync::CancellationToken;

use cli::{CliArgs, CliError};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error("failed to read report {path}: {source}")]
    ReadReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid report: {0}")]
    Report(#[from] CoreError),
    #[error(transparent)]
    Runbook(#[from] RunbookError),
}

fn load_report(path: &Path) -> Result<Vec<EventRecord>, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ReadReport {
        path: path.to_path_buf(),
        source,
    })?;
    let records = EventRecord::parse_report(&content)?;
    tracing::info!(path = %path.display(), records = records.len(), "Report loaded");
    Ok(records)
}

async fn run(args: &CliArgs) -> Result<(), AppError> {
    let config_path = args.resolve_config_path()?;
    let report_path = args.resolve_report_path()?;
    let records = load_report(&report_path)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling dispatch");
            on_signal.cancel();
        }
    });

    let ctx = DispatchContext::with_cancellation(cancel);
    runbook(&ctx, &config_path, &records).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Tracing.
    let filter = match args.resolve_log_level() {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Runbook failed");
            eprintln!("preq-runbook: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, r#"[{"cre": {"id": "CRE-1"}}, {"id": "CRE-2"}]"#).unwrap();
        let records = load_report(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].cre_id(), "CRE-2");
    }

    #[test]
    fn test_load_report_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, r#"{"id": "CRE-1"}"#).unwrap();
        assert!(matches!(load_report(&path), Err(AppError::Report(_))));
    }

    #[test]
    fn test_load_report_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_report(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AppError::ReadReport { .. }));
    }
}
