//! A dispatcher that only logs the notifications it receives.
//!
//! Used when no webhook is configured, and handy when debugging the
//! notification pipeline.

use super::{DispatchError, NotificationDispatcher, NotificationPayload};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
        info!(
            kind = payload.kind.as_str(),
            recipient = %payload.recipient,
            subject = %payload.subject,
            attachment = ?payload.attachment.as_ref().map(|a| (&a.filename, a.bytes.len())),
            "Notification"
        );
        Ok(())
    }
}
