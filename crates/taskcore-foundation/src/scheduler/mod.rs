//! C7 — Scheduler: computes the ready set and dispatches it concurrently,
//! grounded on `mofa-foundation/src/llm/task_orchestrator.rs`'s
//! spawn-plus-concurrency-limit shape, generalized to real parallel dispatch
//! via `tokio::task::JoinSet` rather than the teacher's sequential batching.

mod order;

pub use order::planned_order;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use taskcore_kernel::domain::event::event_types;
use taskcore_kernel::domain::{dag, Event, EventSourceType, Step, StepStatus, Task, TaskStatus};
use taskcore_kernel::error::TaskCoreResult;
use taskcore_kernel::traits::{DispatchOutcome, EventBus, Scheduler, StepDispatcher, TaskContext};
use tokio::sync::Semaphore;

pub struct TokioScheduler {
    dispatcher: Arc<dyn StepDispatcher>,
    bus: Arc<dyn EventBus>,
    global_concurrency: Arc<Semaphore>,
}

impl TokioScheduler {
    pub fn new(dispatcher: Arc<dyn StepDispatcher>, bus: Arc<dyn EventBus>, worker_pool_size: usize) -> Self {
        Self { dispatcher, bus, global_concurrency: Arc::new(Semaphore::new(worker_pool_size.max(1))) }
    }

    /// Steps whose failed/cancelled dependency has `on_dep_failure == Skip`
    /// are themselves marked `Skipped`, transitively.
    fn apply_dependency_skips(steps: &mut [Step]) {
        loop {
            let terminal_non_success: HashSet<String> = steps
                .iter()
                .filter(|s| s.status.is_terminal() && !s.status.is_success())
                .map(|s| s.id.clone())
                .collect();

            let mut changed = false;
            for idx in 0..steps.len() {
                let step = &steps[idx];
                if step.status.is_terminal() {
                    continue;
                }
                let blocked_by_failure = step.depends_on.iter().any(|d| terminal_non_success.contains(d));
                if blocked_by_failure && matches!(step.on_dep_failure, taskcore_kernel::domain::OnDepFailure::Skip) {
                    steps[idx].status = StepStatus::Skipped;
                    steps[idx].completed_at = Some(chrono::Utc::now());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn record_failure(step: &mut Step, kind: &str, message: &str) {
        if step.can_retry() {
            step.status = StepStatus::Pending;
            step.error = Some(taskcore_kernel::domain::step::StepError { kind: kind.to_string(), message: message.to_string() });
        } else {
            step.mark_failed(kind, message);
        }
    }

    /// `WAITING_APPROVAL` is sticky while any step still awaits a checkpoint
    /// decision, and clears once none do.
    fn recompute_waiting_status(task: &mut Task) {
        if task.steps.iter().any(|s| s.status == StepStatus::WaitingApproval) {
            task.status = TaskStatus::WaitingApproval;
        } else if task.status == TaskStatus::WaitingApproval {
            task.status = TaskStatus::Running;
        }
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn schedule_ready_nodes(&self, task: &Task) -> TaskCoreResult<Task> {
        let mut task = task.clone();
        dag::validate(&task.steps)?;
        Self::apply_dependency_skips(&mut task.steps);

        let succeeded: HashSet<String> =
            task.steps.iter().filter(|s| s.status.is_success()).map(|s| s.id.clone()).collect();
        let ready_ids: Vec<String> = dag::ready_steps(&task.steps, &succeeded)
            .into_iter()
            .filter(|id| {
                task.get_step(id).map(|s| matches!(s.status, StepStatus::Pending | StepStatus::Ready)).unwrap_or(false)
            })
            .collect();

        let task_id = task.id.clone();
        let mut join_set = tokio::task::JoinSet::new();

        for step_id in ready_ids {
            let Some(step) = task.get_step(&step_id).cloned() else { continue };

            let dispatcher = self.dispatcher.clone();
            let permit = self.global_concurrency.clone();
            let task_snapshot = task.clone();
            let task_id = task_id.clone();

            join_set.spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                let ctx = TaskContext::new(task_id, step.id.clone(), step.attempts + 1);
                let outcome = dispatcher.dispatch(&ctx, &task_snapshot, &step).await;
                (step.id, outcome)
            });
        }

        let mut results: HashMap<String, TaskCoreResult<DispatchOutcome>> = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            if let Ok((id, outcome)) = joined {
                results.insert(id, outcome);
            }
        }

        for (step_id, outcome) in results {
            let Some(step) = task.get_step_mut(&step_id) else { continue };
            step.mark_running();

            match outcome {
                Ok(DispatchOutcome::Succeeded { output }) => {
                    step.mark_succeeded(output);
                    self.bus
                        .publish(
                            Event::new("scheduler", EventSourceType::Scheduler, event_types::STEP_COMPLETED)
                                .for_task(&task_id)
                                .with_payload("step_id", serde_json::json!(step_id)),
                        )
                        .await?;
                }
                Ok(DispatchOutcome::AwaitingCheckpoint) => {
                    step.status = StepStatus::WaitingApproval;
                    self.bus
                        .publish(
                            Event::new("scheduler", EventSourceType::Scheduler, event_types::CHECKPOINT_CREATED)
                                .for_task(&task_id)
                                .with_payload("step_id", serde_json::json!(step_id)),
                        )
                        .await?;
                }
                Ok(DispatchOutcome::BranchTaken { active_step_ids }) => {
                    step.mark_succeeded(HashMap::from([(
                        "active_step_ids".to_string(),
                        serde_json::json!(active_step_ids.clone()),
                    )]));
                    for other in task.steps.iter_mut() {
                        if other.depends_on.contains(&step_id) && !active_step_ids.contains(&other.id) {
                            other.status = StepStatus::Skipped;
                            other.completed_at = Some(chrono::Utc::now());
                        }
                    }
                }
                Ok(DispatchOutcome::Failed { kind, message }) => {
                    Self::record_failure(step, &kind, &message);
                    self.bus
                        .publish(
                            Event::new("scheduler", EventSourceType::Scheduler, event_types::STEP_FAILED)
                                .for_task(&task_id)
                                .with_payload("step_id", serde_json::json!(step_id))
                                .with_payload("kind", serde_json::json!(kind)),
                        )
                        .await?;
                }
                Err(e) => {
                    let kind = e.kind().to_string();
                    let message = e.to_string();
                    Self::record_failure(step, &kind, &message);
                }
            }
        }

        Self::apply_dependency_skips(&mut task.steps);
        Self::recompute_waiting_status(&mut task);

        Ok(task)
    }
}
