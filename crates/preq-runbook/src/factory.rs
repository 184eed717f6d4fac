//! Builds validated actions from configuration.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::{ActionConfig, ActionSection, RunbookConfig};
use crate::error::{ConfigError, RunbookError};
use crate::filter::FilteredAction;
use crate::handler::{Action, ExecAction, JiraAction, SlackAction};
use crate::secret::{EnvSecrets, SecretSource};

/// Turns [`ActionConfig`] entries into ready-to-run actions.
///
/// Every check (required fields, URLs, templates, secrets, filter patterns)
/// happens here, so a runbook that builds will not fail on configuration
/// during dispatch.
#[derive(Clone)]
pub struct ActionFactory {
    secrets: Arc<dyn SecretSource>,
}

impl ActionFactory {
    pub fn new(secrets: impl SecretSource + 'static) -> Self {
        Self {
            secrets: Arc::new(secrets),
        }
    }

    /// Build one action with its filter.
    pub fn build_action(&self, config: &ActionConfig) -> Result<FilteredAction, ConfigError> {
        let action: Box<dyn Action> = match config.section()? {
            ActionSection::Slack(slack) => Box::new(SlackAction::new(slack)?),
            ActionSection::Jira(jira) => Box::new(JiraAction::new(jira, self.secrets.as_ref())?),
            ActionSection::Exec(exec) => Box::new(ExecAction::new(exec)?),
        };

        let mut filtered = FilteredAction::new(action);
        if let Some(pattern) = config.filter_pattern() {
            filtered = filtered.with_pattern(Regex::new(pattern)?);
        }
        Ok(filtered)
    }

    /// Build every action in document order. The first failure is returned
    /// with the zero-based position of the offending entry.
    pub fn build(&self, config: &RunbookConfig) -> Result<Vec<FilteredAction>, RunbookError> {
        config
            .actions
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let action = self
                    .build_action(entry)
                    .map_err(|source| RunbookError::Action { index, source })?;
                debug!(index, action = %action.describe(), "Action built");
                Ok(action)
            })
            .collect()
    }
}

impl Default for ActionFactory {
    fn default() -> Self {
        Self::new(EnvSecrets)
    }
}

impl std::fmt::Debug for ActionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionFactory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionKind;
    use crate::secret::StaticSecrets;

    fn factory() -> ActionFactory {
        ActionFactory::new(StaticSecrets::new().with("JIRA_TOKEN", "t0ken"))
    }

    fn parse(yaml: &str) -> RunbookConfig {
        RunbookConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_build_all_kinds() {
        let config = parse(
            r#"
actions:
  - type: slack
    regex: "^CRE-2025"
    slack:
      webhook_url: https://hooks.example/slack
      message_template: "{{ .Reason }}"
  - type: jira
    jira:
      webhook_url: https://jira.example/hook
      secret_env: JIRA_TOKEN
      summary_template: "{{ .Reason }}"
      project_key: PREQ
  - type: exec
    exec:
      path: /bin/true
"#,
        );
        let actions = factory().build(&config).unwrap();
        let kinds: Vec<_> = actions.iter().map(FilteredAction::kind).collect();
        assert_eq!(kinds, [ActionKind::Slack, ActionKind::Jira, ActionKind::Exec]);
        assert_eq!(
            actions[0].pattern().map(Regex::as_str),
            Some("^CRE-2025")
        );
        assert!(actions[1].pattern().is_none());
    }

    #[test]
    fn test_build_empty_runbook() {
        assert!(factory().build(&RunbookConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_build_reports_index() {
        let config = parse(
            r#"
actions:
  - type: exec
    exec:
      path: /bin/true
  - type: exec
    exec:
      args: ["x"]
"#,
        );
        let err = factory().build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                index: 1,
                source: ConfigError::MissingField("exec.path")
            }
        ));
        assert_eq!(err.to_string(), "action #1: exec.path is required");
    }

    #[test]
    fn test_build_unknown_type() {
        let config = parse("actions:\n  - type: email\n");
        let err = factory().build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                index: 0,
                source: ConfigError::UnknownType(_)
            }
        ));
    }

    #[test]
    fn test_build_missing_section() {
        let config = parse("actions:\n  - type: slack\n");
        let err = factory().build(&config).unwrap_err();
        assert_eq!(err.to_string(), "action #0: missing slack section");
    }

    #[test]
    fn test_build_invalid_regex() {
        let config = parse(
            r#"
actions:
  - type: exec
    regex: "(unclosed"
    exec:
      path: /bin/true
"#,
        );
        let err = factory().build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                source: ConfigError::InvalidRegex(_),
                ..
            }
        ));
    }

    #[test]
    fn test_build_jira_without_secret() {
        let config = parse(
            r#"
actions:
  - type: jira
    jira:
      webhook_url: https://jira.example/hook
      secret_env: UNSET_TOKEN
      summary_template: s
      project_key: PREQ
"#,
        );
        let err = ActionFactory::new(StaticSecrets::new()).build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                source: ConfigError::MissingSecret,
                ..
            }
        ));
    }

    #[test]
    fn test_build_rejects_non_http_webhook() {
        let config = parse(
            r#"
actions:
  - type: slack
    slack:
      webhook_url: ftp://example.com/h
      message_template: hi
"#,
        );
        let err = factory().build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                index: 0,
                source: ConfigError::UnsupportedScheme { field: "slack.webhook_url", .. }
            }
        ));
        assert_eq!(
            err.to_string(),
            "action #0: slack.webhook_url must use http or https, got \"ftp\""
        );
    }

    #[test]
    fn test_build_jira_secret_with_newline() {
        let config = parse(
            r#"
actions:
  - type: jira
    jira:
      webhook_url: https://jira.example/hook
      secret: "abc\n"
      summary_template: s
      project_key: PREQ
"#,
        );
        let err = factory().build(&config).unwrap_err();
        assert!(matches!(
            err,
            RunbookError::Action {
                source: ConfigError::InvalidSecret(_),
                ..
            }
        ));
    }
}
