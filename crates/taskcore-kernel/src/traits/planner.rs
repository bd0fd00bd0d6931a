//! C5 — Planner: turns a task's goal/constraints into a step DAG, and can
//! replan around a `ReplanRequested` finding.

use async_trait::async_trait;

use crate::domain::{Finding, Step, Task};
use crate::error::TaskCoreResult;

/// A planner's raw proposal before DAG validation is applied by the caller.
#[derive(Debug, Clone)]
pub struct PlanProposal {
    pub steps: Vec<Step>,
    pub rationale: Option<String>,
}

#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce an initial plan for a freshly-created task.
    async fn plan(&self, task: &Task) -> TaskCoreResult<PlanProposal>;

    /// Produce a revised plan in response to a `ReplanRequested` finding.
    /// Implementations must carry forward the outputs of already-succeeded
    /// steps (Open Question 1) — the caller splices `old_completed_results`
    /// into the returned proposal's matching step ids.
    async fn replan(&self, task: &Task, trigger: &Finding) -> TaskCoreResult<PlanProposal>;
}

/// Narrow seam to an LLM backend; a planner implementation is built on top of
/// this rather than embedding HTTP/model details directly.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> TaskCoreResult<String>;
}
