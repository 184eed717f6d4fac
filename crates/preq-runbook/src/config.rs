//! Runbook configuration model.
//!
//! A runbook is a YAML document listing the actions to run for every
//! detected event:
//!
//! ```yaml
//! actions:
//!   - type: slack
//!     regex: "CRE-2025-00.*"
//!     slack:
//!       webhook_url: https://hooks.slack.com/services/T000/B000/XXX
//!       message_template: "Reason: {{ .Reason }}"
//! ```
//!
//! Missing string fields decode as empty and are rejected by the factory
//! so that every configuration error carries the action's position.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, RunbookError};

/// Action variants a runbook can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Chat notification webhook.
    Slack,
    /// Issue tracker automation webhook.
    Jira,
    /// Local process invocation.
    Exec,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Slack => write!(f, "slack"),
            ActionKind::Jira => write!(f, "jira"),
            ActionKind::Exec => write!(f, "exec"),
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slack" => Ok(ActionKind::Slack),
            "jira" => Ok(ActionKind::Jira),
            "exec" => Ok(ActionKind::Exec),
            _ => Err(ConfigError::UnknownType(s.to_string())),
        }
    }
}

/// Top-level runbook document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunbookConfig {
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

impl RunbookConfig {
    /// Load a runbook from a YAML file.
    pub fn load(path: &Path) -> Result<Self, RunbookError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunbookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        info!(
            path = %path.display(),
            actions = config.actions.len(),
            "Runbook configuration loaded"
        );
        Ok(config)
    }

    /// Parse a runbook from YAML text. An empty document has no actions.
    pub fn from_yaml(content: &str) -> Result<Self, RunbookError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// One entry of the `actions` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// `slack`, `jira` or `exec`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Optional pattern matched against the event's CRE id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
}

/// The type-specific section of an [`ActionConfig`], checked against its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSection<'a> {
    Slack(&'a SlackConfig),
    Jira(&'a JiraConfig),
    Exec(&'a ExecConfig),
}

impl ActionConfig {
    /// Resolve the tag to exactly one type-specific section.
    ///
    /// Fails on an unknown tag, a missing section, or a section belonging to
    /// another action type.
    pub fn section(&self) -> Result<ActionSection<'_>, ConfigError> {
        let kind: ActionKind = self.kind.parse()?;

        let present = [
            (ActionKind::Slack, self.slack.is_some()),
            (ActionKind::Jira, self.jira.is_some()),
            (ActionKind::Exec, self.exec.is_some()),
        ];
        if let Some((extra, _)) = present
            .iter()
            .find(|(other, is_present)| *is_present && *other != kind)
        {
            return Err(ConfigError::ConflictingSection {
                kind,
                extra: *extra,
            });
        }

        match kind {
            ActionKind::Slack => self.slack.as_ref().map(ActionSection::Slack),
            ActionKind::Jira => self.jira.as_ref().map(ActionSection::Jira),
            ActionKind::Exec => self.exec.as_ref().map(ActionSection::Exec),
        }
        .ok_or(ConfigError::MissingSection(kind))
    }

    /// The filter pattern, if one is set and non-empty.
    pub fn filter_pattern(&self) -> Option<&str> {
        self.regex.as_deref().filter(|r| !r.is_empty())
    }
}

/// Chat notification webhook settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub message_template: String,
}

/// Issue tracker automation webhook settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub webhook_url: String,
    /// Token sent as `X-Automation-Webhook-Token`. Takes precedence over
    /// `secret_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Name of the secret to look up when `secret` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,
    pub summary_template: String,
    pub description_template: String,
    /// Project key, e.g. `PREQ`.
    pub project_key: String,
}

/// Local process settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub path: String,
    /// Argument templates, rendered independently.
    pub args: Vec<String>,
}
