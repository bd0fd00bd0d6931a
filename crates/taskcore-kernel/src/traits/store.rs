//! C1 — Task Store: the single source of truth for task aggregates.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::{Task, TaskId};
use crate::error::TaskCoreResult;

/// Narrow filter for `list_tasks`; all fields are conjunctive (AND).
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<crate::domain::TaskStatus>,
    pub tree_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Partial update applied atomically under the version check in
/// `update_task`. Every field is optional; `None` leaves that field alone.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<crate::domain::TaskStatus>,
    pub steps: Option<Vec<crate::domain::Step>>,
    pub findings: Option<Vec<crate::domain::Finding>>,
    pub current_step_index: Option<usize>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub completed_at: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

/// C1: durable task storage with optimistic concurrency control.
///
/// `update_task` must fail with `TaskCoreError::StaleVersion` when
/// `expected_version` does not match the currently persisted version — see
/// spec §4.1 and invariant P2. Implementations own both the durable backing
/// and any read-through cache; the cache is invisible at this trait boundary.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: Task) -> TaskCoreResult<Task>;

    async fn get_task(&self, id: &TaskId) -> TaskCoreResult<Task>;

    async fn update_task(&self, id: &TaskId, expected_version: u64, patch: TaskPatch) -> TaskCoreResult<Task>;

    async fn list_tasks(&self, filter: TaskFilter) -> TaskCoreResult<Vec<Task>>;

    async fn delete_task(&self, id: &TaskId) -> TaskCoreResult<()>;

    /// Convenience path used heavily by the scheduler/dispatcher: update one
    /// step's status/output/error without the caller reconstructing the
    /// whole task. Still subject to the same optimistic version check.
    async fn update_step_status(
        &self,
        id: &TaskId,
        expected_version: u64,
        step_id: &str,
        step: crate::domain::Step,
    ) -> TaskCoreResult<Task>;
}
