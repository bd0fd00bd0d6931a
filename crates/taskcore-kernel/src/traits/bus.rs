//! C2 — Event Bus: dotted-pattern pub/sub over `Event`, bridged to SSE.

use async_trait::async_trait;

use crate::domain::Event;
use crate::error::TaskCoreResult;

/// A live handle to a pattern subscription. Dropping it should be enough to
/// unsubscribe; `EventBus::unsubscribe` exists for callers that want to do so
/// without dropping (e.g. to swap a pattern on the same logical subscriber).
pub struct Subscription {
    pub id: String,
    pub receiver: tokio::sync::mpsc::Receiver<Event>,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Event) -> TaskCoreResult<()>;

    /// Subscribe to events whose `event_type` matches the dotted pattern
    /// (`*` / `**` wildcards — see `domain::event::pattern_matches`).
    async fn subscribe(&self, pattern: &str) -> TaskCoreResult<Subscription>;

    async fn unsubscribe(&self, subscription_id: &str) -> TaskCoreResult<()>;

    /// Replay up to `limit` most-recent events matching `pattern` from the
    /// bounded in-memory log (`EVENT_REPLAY_LOG_SIZE`), oldest first. Used to
    /// give a newly-opened SSE stream the backlog it missed.
    async fn replay(&self, pattern: &str, limit: usize) -> TaskCoreResult<Vec<Event>>;
}
