//! A dispatcher that posts notifications to an HTTP webhook as JSON.

use super::{DispatchError, NotificationDispatcher, NotificationPayload};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Posts each payload as a JSON document to a mail relay or chat webhook.
///
/// Attachment bytes are base64 encoded in the JSON body.
pub struct WebhookDispatcher {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Creates a new `WebhookDispatcher` whose requests give up after `timeout`.
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, payload), fields(kind = payload.kind.as_str()))]
    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to notification webhook failed");
                DispatchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            info!(recipient = %payload.recipient, "Successfully sent notification to webhook.");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %body,
                "Notification webhook rejected the request"
            );
            Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
