//! C7 — Scheduler: picks ready steps and dispatches them under the
//! concurrency/lease/retry rules of spec §4.7/§5.

use async_trait::async_trait;

use crate::domain::Task;
use crate::error::TaskCoreResult;

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Compute the ready set for `task` (dependency-gated, DAG-ordered) and
    /// dispatch as many as the task's and the global concurrency budgets
    /// allow. Returns the updated task after any steps that completed
    /// synchronously within the call are applied; steps still running are
    /// reflected by their `Running` status.
    async fn schedule_ready_nodes(&self, task: &Task) -> TaskCoreResult<Task>;
}
