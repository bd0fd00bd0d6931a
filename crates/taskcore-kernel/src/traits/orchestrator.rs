//! C8 — Orchestrator: drives a task through its full state machine
//! (spec §4.8), coordinating the planner, scheduler, checkpoint manager, and
//! event bus.

use async_trait::async_trait;

use crate::domain::{Task, TaskId};
use crate::error::TaskCoreResult;

#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Run a `DRAFT` task through planning and into `RUNNING`, advancing the
    /// scheduler until the task reaches a terminal or waiting state.
    async fn run(&self, task_id: &TaskId) -> TaskCoreResult<Task>;

    /// Resume a task that is `WAITING_APPROVAL` after its blocking
    /// checkpoint has been resolved.
    async fn resume(&self, task_id: &TaskId) -> TaskCoreResult<Task>;

    /// Splice a fresh plan (from a `ReplanRequested` finding) into the task,
    /// preserving already-succeeded step outputs, and continue running.
    async fn replan(&self, task_id: &TaskId) -> TaskCoreResult<Task>;

    async fn cancel(&self, task_id: &TaskId) -> TaskCoreResult<Task>;
}
