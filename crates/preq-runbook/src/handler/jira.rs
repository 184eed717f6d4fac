//! Issue tracker automation webhook action.
//!
//! Creates a `Bug` by posting to a Jira Automation incoming webhook. The
//! description is sent as a single-paragraph Atlassian document.

use async_trait::async_trait;
use preq_core::{EventRecord, Template};
use reqwest::header::HeaderValue;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::webhook::Webhook;
use super::Action;
use crate::config::{ActionKind, JiraConfig};
use crate::context::DispatchContext;
use crate::error::{ActionError, ConfigError};
use crate::secret::{resolve_secret, SecretSource};

/// Header carrying the automation webhook secret.
pub const TOKEN_HEADER: &str = "X-Automation-Webhook-Token";

/// Issue type of every created issue.
const ISSUE_TYPE: &str = "Bug";

/// Handler for `jira` actions.
#[derive(Debug)]
pub struct JiraAction {
    webhook: Webhook,
    summary: Template,
    description: Template,
    project_key: String,
    secret: HeaderValue,
}

fn compile(field: &str, name: &str, source: &str) -> Result<Template, ConfigError> {
    Template::compile(name, source).map_err(|source| ConfigError::Template {
        field: field.to_string(),
        source,
    })
}

impl JiraAction {
    /// Validate the config, compile templates and resolve the secret.
    pub fn new(config: &JiraConfig, secrets: &dyn SecretSource) -> Result<Self, ConfigError> {
        let webhook = Webhook::new(ActionKind::Jira, "jira.webhook_url", &config.webhook_url)?;
        if config.summary_template.is_empty() {
            return Err(ConfigError::MissingField("jira.summary_template"));
        }
        if config.project_key.is_empty() {
            return Err(ConfigError::MissingField("jira.project_key"));
        }

        let summary = compile("jira.summary_template", "jira-summary", &config.summary_template)?;
        let description = compile(
            "jira.description_template",
            "jira-desc",
            &config.description_template,
        )?;

        let secret = resolve_secret(
            config.secret.as_deref(),
            config.secret_env.as_deref(),
            secrets,
        )
        .ok_or(ConfigError::MissingSecret)?;
        let mut secret = HeaderValue::from_str(&secret).map_err(ConfigError::InvalidSecret)?;
        secret.set_sensitive(true);

        Ok(Self {
            webhook,
            summary,
            description,
            project_key: config.project_key.clone(),
            secret,
        })
    }

    /// Request body for one issue.
    pub(crate) fn payload(&self, summary: &str, description: &str) -> Value {
        json!({
            "project": { "key": self.project_key },
            "summary": summary,
            "description": adf_paragraph(description),
            "issuetype": { "name": ISSUE_TYPE },
        })
    }
}

/// Wrap plain text as an Atlassian document with one paragraph.
pub fn adf_paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{
                "type": "text",
                "text": text,
            }],
        }],
    })
}

#[async_trait]
impl Action for JiraAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Jira
    }

    fn describe(&self) -> String {
        format!(
            "Create {} issue in {} via {}",
            ISSUE_TYPE,
            self.project_key,
            self.webhook.url()
        )
    }

    async fn execute(
        &self,
        ctx: &DispatchContext,
        record: &EventRecord,
    ) -> Result<(), ActionError> {
        let summary = self.summary.render(record)?;
        let description = self.description.render(record)?;
        debug!(cre_id = record.cre_id(), summary = %summary, "Jira issue rendered");

        self.webhook
            .post(
                ctx,
                &self.payload(&summary, &description),
                Some((TOKEN_HEADER, self.secret.clone())),
            )
            .await?;

        info!(
            cre_id = record.cre_id(),
            project = %self.project_key,
            "Jira issue created"
        );
        Ok(())
    }
}
