//! A dispatcher that records every payload it is asked to send.

use async_trait::async_trait;
use fleetwatch::notification::{
    DispatchError, NotificationDispatcher, NotificationKind, NotificationPayload,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<NotificationPayload>>>,
    failing_markers: Arc<Mutex<HashSet<String>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send whose HTML body contains `marker` fail.
    pub fn fail_when_body_contains(&self, marker: &str) {
        self.failing_markers.lock().unwrap().insert(marker.to_string());
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of_kind(&self, kind: NotificationKind) -> Vec<NotificationPayload> {
        self.sent()
            .into_iter()
            .filter(|payload| payload.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(payload.clone());
        let fails = self
            .failing_markers
            .lock()
            .unwrap()
            .iter()
            .any(|marker| payload.html_body.contains(marker.as_str()));
        if fails {
            Err(DispatchError::Transport("mail relay refused connection".to_string()))
        } else {
            Ok(())
        }
    }
}
