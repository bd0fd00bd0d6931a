//! C6 — Step Dispatcher: resolves a ready step's inputs and runs it to a
//! terminal `StepStatus`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{Step, Task};
use crate::error::TaskCoreResult;
use crate::traits::context::TaskContext;

/// Outcome of dispatching one step. Distinct from `StepStatus` because a
/// dispatch can also request a checkpoint suspension or a replan, neither of
/// which is itself a terminal status for the step.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Succeeded { output: HashMap<String, serde_json::Value> },
    Failed { kind: String, message: String },
    AwaitingCheckpoint,
    /// A `Branch` step's expression evaluated to a value selecting which
    /// dependent steps remain active; non-selected branches are skipped.
    BranchTaken { active_step_ids: Vec<String> },
}

#[async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn dispatch(&self, ctx: &TaskContext, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome>;
}

/// Per-step, per-run view over file references attached to a task, used by
/// the dispatcher to enforce classification/size caps before a step runs.
/// Object storage itself is out of scope; this trait is the dispatcher-facing
/// seam over whatever provides it.
#[async_trait]
pub trait FileService: Send + Sync {
    async fn resolve(&self, reference: &serde_json::Value) -> TaskCoreResult<FileContext>;
}

#[derive(Debug, Clone)]
pub struct FileContext {
    pub content_type: String,
    pub size_bytes: u64,
    pub classification: String,
}
