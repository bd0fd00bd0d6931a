//! `send_email` system plugin: always requires a checkpoint (spec §4.4) and
//! delegates actual delivery to a `NotificationProvider` — this repo's only
//! implementation is an in-memory recorder, since real SMTP/Postmark
//! delivery is the external notification service named in spec §1.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{NotificationMessage, NotificationProvider, PluginExecutor, TaskContext};

pub struct SendEmailPlugin {
    notifier: Arc<dyn NotificationProvider>,
}

impl SendEmailPlugin {
    pub fn new(notifier: Arc<dyn NotificationProvider>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl PluginExecutor for SendEmailPlugin {
    async fn execute(
        &self,
        _ctx: &TaskContext,
        inputs: HashMap<String, serde_json::Value>,
    ) -> TaskCoreResult<HashMap<String, serde_json::Value>> {
        let to = inputs
            .get("to")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TaskCoreError::invalid_input("send_email requires a string `to` input"))?
            .to_string();
        let subject = inputs.get("subject").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let body = inputs.get("body").and_then(|v| v.as_str()).unwrap_or_default().to_string();

        self.notifier.send(NotificationMessage { to: to.clone(), subject, body }).await?;

        let mut out = HashMap::new();
        out.insert("sent".to_string(), serde_json::json!(true));
        out.insert("to".to_string(), serde_json::json!(to));
        Ok(out)
    }
}

/// In-memory recorder used by tests and by default wiring; never delivers
/// anything externally.
#[derive(Default)]
pub struct RecordingNotificationProvider {
    sent: parking_lot::Mutex<Vec<NotificationMessage>>,
}

impl RecordingNotificationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationProvider for RecordingNotificationProvider {
    async fn send(&self, message: NotificationMessage) -> TaskCoreResult<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}
