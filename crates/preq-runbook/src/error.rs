//! Error types for the runbook.

use std::path::PathBuf;
use std::process::ExitStatus;

use preq_core::TemplateError;

use crate::config::ActionKind;

/// Errors in a single action entry, detected while building it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown action type {0:?}")]
    UnknownType(String),
    #[error("missing {0} section")]
    MissingSection(ActionKind),
    #[error("unexpected {extra} section in {kind} action")]
    ConflictingSection { kind: ActionKind, extra: ActionKind },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{field} must use http or https, got {scheme:?}")]
    UnsupportedScheme { field: &'static str, scheme: String },
    #[error("jira secret missing; set either 'secret' or 'secret_env'")]
    MissingSecret,
    #[error("jira secret is not a valid header value: {0}")]
    InvalidSecret(#[source] reqwest::header::InvalidHeaderValue),
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("invalid {field}: {source}")]
    Template {
        field: String,
        #[source]
        source: TemplateError,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors from executing an action against one event record.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Render(#[from] TemplateError),
    #[error("{action} post: {source}")]
    Http {
        action: ActionKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{action} post failed: {status} - {body}")]
    Status {
        action: ActionKind,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to serialize event record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write event record to {path}: {source}")]
    Stdin {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for {path}: {source}")]
    Wait {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} {status}")]
    Exit { path: PathBuf, status: ExitStatus },
    #[error("dispatch cancelled")]
    Cancelled,
    #[error("dispatch deadline exceeded")]
    DeadlineExceeded,
}

/// Errors surfaced by the runbook entry point.
#[derive(Debug, thiserror::Error)]
pub enum RunbookError {
    #[error("failed to read runbook config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse runbook config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("action #{index}: {source}")]
    Action {
        index: usize,
        #[source]
        source: ConfigError,
    },
    #[error("action #{action} ({kind}) failed on event #{record}: {source}")]
    Dispatch {
        action: usize,
        kind: ActionKind,
        record: usize,
        #[source]
        source: ActionError,
    },
}

impl RunbookError {
    /// The underlying action failure, if dispatch failed.
    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            RunbookError::Dispatch { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A specialized `Result` type for runbook operations.
pub type Result<T> = std::result::Result<T, RunbookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownType("email".to_string());
        assert_eq!(err.to_string(), "unknown action type \"email\"");

        let err = ConfigError::MissingSection(ActionKind::Slack);
        assert_eq!(err.to_string(), "missing slack section");

        let err = ConfigError::ConflictingSection {
            kind: ActionKind::Slack,
            extra: ActionKind::Jira,
        };
        assert_eq!(err.to_string(), "unexpected jira section in slack action");

        let err = ConfigError::MissingField("slack.webhook_url");
        assert_eq!(err.to_string(), "slack.webhook_url is required");

        let err = ConfigError::UnsupportedScheme {
            field: "slack.webhook_url",
            scheme: "ftp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "slack.webhook_url must use http or https, got \"ftp\""
        );

        let err = ConfigError::MissingSecret;
        assert_eq!(
            err.to_string(),
            "jira secret missing; set either 'secret' or 'secret_env'"
        );
    }

    #[test]
    fn test_invalid_regex_conversion() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let err: ConfigError = regex_err.into();
        assert!(matches!(err, ConfigError::InvalidRegex(_)));
        assert!(err.to_string().starts_with("invalid regex: "));
    }

    #[test]
    fn test_runbook_error_names_position() {
        let err = RunbookError::Action {
            index: 2,
            source: ConfigError::MissingSection(ActionKind::Exec),
        };
        assert_eq!(err.to_string(), "action #2: missing exec section");
        assert!(err.action_error().is_none());
    }

    #[test]
    fn test_status_error_includes_status_and_body() {
        let err = ActionError::Status {
            action: ActionKind::Slack,
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "upstream down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "slack post failed: 500 Internal Server Error - upstream down"
        );

        let err = RunbookError::Dispatch {
            action: 0,
            kind: ActionKind::Slack,
            record: 1,
            source: err,
        };
        assert!(err.to_string().contains("500"));
        assert!(err.action_error().is_some());
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(ActionError::Cancelled.to_string(), "dispatch cancelled");
        assert_eq!(
            ActionError::DeadlineExceeded.to_string(),
            "dispatch deadline exceeded"
        );
    }
}
