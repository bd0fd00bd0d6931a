//! C3 — Checkpoint Manager: creates, resolves, and auto-decides checkpoints.

use async_trait::async_trait;

use crate::domain::{Checkpoint, CheckpointDecision, CheckpointResponse};
use crate::domain::step::CheckpointDescriptor;
use crate::error::TaskCoreResult;

#[async_trait]
pub trait CheckpointManager: Send + Sync {
    /// Create a pending checkpoint for a step from its descriptor, with an
    /// expiry computed from `CHECKPOINT_DEFAULT_EXPIRY_SECONDS` unless the
    /// descriptor itself overrides it.
    async fn create_checkpoint(
        &self,
        task_id: &str,
        step_id: &str,
        descriptor: &CheckpointDescriptor,
    ) -> TaskCoreResult<Checkpoint>;

    /// Resolve a pending checkpoint with a human decision. When
    /// `response.learn` is set, the resolution is also fed to the preference
    /// store (narrowest scope first — spec §4.3).
    async fn resolve_checkpoint(
        &self,
        task_id: &str,
        step_id: &str,
        decision: CheckpointDecision,
        response: Option<CheckpointResponse>,
        decided_by: Option<String>,
    ) -> TaskCoreResult<Checkpoint>;

    /// Before surfacing a new checkpoint to a human, check whether a learned
    /// preference already decides it above `AUTO_APPROVE_THRESHOLD`. Returns
    /// `None` when no preference applies and a human must be asked.
    async fn try_auto_decide(
        &self,
        task_id: &str,
        step_id: &str,
        descriptor: &CheckpointDescriptor,
    ) -> TaskCoreResult<Option<Checkpoint>>;

    async fn get_pending(&self, task_id: &str) -> TaskCoreResult<Vec<Checkpoint>>;

    /// The checkpoint record for this step regardless of decision state, so
    /// a caller can distinguish "still pending" from "already resolved"
    /// without re-triggering the create/auto-decide path. `None` means no
    /// checkpoint has ever been recorded for this step.
    async fn get_resolution(&self, task_id: &str, step_id: &str) -> TaskCoreResult<Option<Checkpoint>>;

    /// Sweep pending checkpoints whose `expires_at` has passed and mark them
    /// `Expired`, independent of the owning task's status (Open Question 2).
    async fn expire_overdue(&self) -> TaskCoreResult<Vec<Checkpoint>>;
}
