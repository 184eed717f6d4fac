//! JSON webhook client shared by the webhook actions.

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::config::ActionKind;
use crate::context::DispatchContext;
use crate::error::{ActionError, ConfigError};

/// Per-request timeout for every webhook call.
pub(crate) const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// A validated webhook endpoint with its own HTTP client.
#[derive(Debug, Clone)]
pub(crate) struct Webhook {
    action: ActionKind,
    url: Url,
    client: Client,
}

impl Webhook {
    /// Validate `url` and build a client with [`WEBHOOK_TIMEOUT`].
    ///
    /// `field` names the config key in error messages.
    pub(crate) fn new(
        action: ActionKind,
        field: &'static str,
        url: &str,
    ) -> Result<Self, ConfigError> {
        if url.is_empty() {
            return Err(ConfigError::MissingField(field));
        }
        let url = Url::parse(url).map_err(|source| ConfigError::InvalidUrl { field, source })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                field,
                scheme: url.scheme().to_string(),
            });
        }
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self {
            action,
            url,
            client,
        })
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    /// POST `body` as JSON. Any status of 300 or above is an error carrying
    /// the status line and response body.
    pub(crate) async fn post<B>(
        &self,
        ctx: &DispatchContext,
        body: &B,
        header: Option<(&'static str, HeaderValue)>,
    ) -> Result<(), ActionError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some((name, value)) = header {
            request = request.header(name, value);
        }

        let response = ctx
            .run(async {
                request.send().await.map_err(|source| ActionError::Http {
                    action: self.action,
                    source,
                })
            })
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = ctx
                .run(async { Ok(response.text().await.unwrap_or_default()) })
                .await?;
            warn!(action = %self.action, %status, "Webhook returned failure status");
            return Err(ActionError::Status {
                action: self.action,
                status,
                body,
            });
        }

        Ok(())
    }
}
