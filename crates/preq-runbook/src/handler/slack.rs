//! Chat notification webhook action.
//!
//! Posts `{"text": <rendered message>}` to an incoming-webhook URL.

use async_trait::async_trait;
use preq_core::{EventRecord, Template};
use serde::Serialize;
use tracing::{debug, info};

use super::webhook::Webhook;
use super::Action;
use crate::config::{ActionKind, SlackConfig};
use crate::context::DispatchContext;
use crate::error::{ActionError, ConfigError};

/// Handler for `slack` actions.
#[derive(Debug)]
pub struct SlackAction {
    webhook: Webhook,
    message: Template,
}

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

impl SlackAction {
    pub fn new(config: &SlackConfig) -> Result<Self, ConfigError> {
        let webhook = Webhook::new(ActionKind::Slack, "slack.webhook_url", &config.webhook_url)?;
        if config.message_template.is_empty() {
            return Err(ConfigError::MissingField("slack.message_template"));
        }
        let message = Template::compile("slack", &config.message_template).map_err(|source| {
            ConfigError::Template {
                field: "slack.message_template".to_string(),
                source,
            }
        })?;
        Ok(Self { webhook, message })
    }
}

#[async_trait]
impl Action for SlackAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Slack
    }

    fn describe(&self) -> String {
        format!("Post notification to {}", self.webhook.url())
    }

    async fn execute(
        &self,
        ctx: &DispatchContext,
        record: &EventRecord,
    ) -> Result<(), ActionError> {
        let text = self.message.render(record)?;
        debug!(cre_id = record.cre_id(), "Slack message rendered");

        self.webhook
            .post(ctx, &SlackMessage { text: &text }, None)
            .await?;

        info!(cre_id = record.cre_id(), "Slack notification posted");
        Ok(())
    }
}
