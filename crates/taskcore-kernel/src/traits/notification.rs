//! External collaborator seam: outbound notification delivery (spec §1, out
//! of scope for real SMTP/webhook code — `send_email` plugin delegates here).

use async_trait::async_trait;

use crate::error::TaskCoreResult;

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send(&self, message: NotificationMessage) -> TaskCoreResult<()>;
}
