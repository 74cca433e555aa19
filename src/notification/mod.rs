//! Handles composing and dispatching fleet notifications.
//!
//! Notifications are best-effort: every caller hands a composed payload to
//! [`dispatch_contained`], which bounds the dispatch with a timeout and logs
//! any failure instead of propagating it. A slow or failing channel can never
//! roll back the store mutation that preceded it.
pub mod composer;
pub mod logging;
pub mod webhook;

use async_trait::async_trait;
use base64::Engine;
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

pub use composer::{FleetEvent, NotificationComposer};
pub use logging::LoggingDispatcher;
pub use webhook::WebhookDispatcher;

/// The event a notification was composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NotificationKind {
    Registered,
    Updated,
    Deleted,
    MaintenanceDue,
    FleetReport,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Registered => "registered",
            NotificationKind::Updated => "updated",
            NotificationKind::Deleted => "deleted",
            NotificationKind::MaintenanceDue => "maintenance_due",
            NotificationKind::FleetReport => "fleet_report",
        }
    }
}

/// An image embedded in the HTML body and referenced as `cid:<content_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    pub content_id: String,
    /// Location of the image resource understood by the dispatcher.
    pub resource: String,
}

/// A binary file attached to the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(serialize_with = "serialize_base64")]
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// A fully composed notification, ready to hand to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_image: Option<InlineImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notification dispatch timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers composed notifications.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// A short name for the channel (e.g., "webhook", "log"), used in logs.
    fn name(&self) -> &str;

    /// Delivers a single notification.
    ///
    /// # Returns
    /// * `Ok(())` if the channel accepted the notification
    /// * `Err(DispatchError)` if delivery failed
    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError>;
}

/// Dispatches `payload`, bounding the call with `timeout` and logging any
/// failure. Returns whether the dispatch succeeded.
pub async fn dispatch_contained(
    dispatcher: &dyn NotificationDispatcher,
    payload: &NotificationPayload,
    timeout: Duration,
) -> bool {
    let outcome = match tokio::time::timeout(timeout, dispatcher.send(payload)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(timeout)),
    };

    match outcome {
        Ok(()) => {
            debug!(
                channel = dispatcher.name(),
                kind = payload.kind.as_str(),
                recipient = %payload.recipient,
                "Notification dispatched"
            );
            metrics::counter!("notifications_sent", "kind" => payload.kind.as_str()).increment(1);
            true
        }
        Err(e) => {
            error!(
                channel = dispatcher.name(),
                kind = payload.kind.as_str(),
                recipient = %payload.recipient,
                error = %e,
                "Failed to dispatch notification"
            );
            metrics::counter!("notifications_failed", "kind" => payload.kind.as_str())
                .increment(1);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowDispatcher;

    #[async_trait]
    impl NotificationDispatcher for SlowDispatcher {
        fn name(&self) -> &str {
            "slow"
        }

        async fn send(&self, _payload: &NotificationPayload) -> Result<(), DispatchError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDispatcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl NotificationDispatcher for CountingDispatcher {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _payload: &NotificationPayload) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DispatchError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            kind: NotificationKind::Deleted,
            recipient: "ops@example.com".to_string(),
            subject: "Vehicle Deletion Successful".to_string(),
            html_body: "<html></html>".to_string(),
            inline_image: None,
            attachment: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_contained_times_out_slow_channel() {
        let ok = dispatch_contained(&SlowDispatcher, &payload(), Duration::from_secs(5)).await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_dispatch_contained_reports_outcome() {
        let healthy = CountingDispatcher::default();
        assert!(dispatch_contained(&healthy, &payload(), Duration::from_secs(1)).await);

        let failing = CountingDispatcher {
            fail: true,
            ..Default::default()
        };
        assert!(!dispatch_contained(&failing, &payload(), Duration::from_secs(1)).await);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attachment_serializes_as_base64() {
        let mut payload = payload();
        payload.attachment = Some(Attachment {
            bytes: b"hello".to_vec(),
            filename: "report.csv".to_string(),
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["attachment"]["bytes"], "aGVsbG8=");
        assert_eq!(value["kind"], "Deleted");
        assert!(value.get("inline_image").is_none());
    }
}
