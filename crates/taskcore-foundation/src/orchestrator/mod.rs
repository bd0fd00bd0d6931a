//! C8 — Orchestrator: the task state machine from spec §4.8, coordinating
//! the planner, scheduler, checkpoint manager, store, and event bus.
//! Grounded on `mofa-foundation/src/llm/task_orchestrator.rs`'s run loop,
//! generalized with the per-task lease spec §5 requires (only one
//! scheduling pass per task id at a time).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use taskcore_kernel::domain::event::event_types;
use taskcore_kernel::domain::{Event, EventSourceType, Task, TaskId, TaskStatus};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{CheckpointManager, EventBus, Planner, Scheduler, TaskStore};
use tokio::sync::Mutex as AsyncMutex;

/// Per-task lease: serializes scheduling passes for a single task id without
/// blocking passes for other tasks. Held only for the duration of a single
/// plan/schedule step, never across a step's own execution (spec §5).
struct TaskLeases {
    locks: DashMap<TaskId, Arc<AsyncMutex<()>>>,
}

impl TaskLeases {
    fn new() -> Self {
        Self { locks: DashMap::new() }
    }

    fn lease(&self, task_id: &TaskId) -> Arc<AsyncMutex<()>> {
        self.locks.entry(task_id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }
}

pub struct TaskOrchestrator {
    store: Arc<dyn TaskStore>,
    bus: Arc<dyn EventBus>,
    planner: Arc<dyn Planner>,
    scheduler: Arc<dyn Scheduler>,
    checkpoints: Arc<dyn CheckpointManager>,
    max_planning_retries: u32,
    leases: TaskLeases,
}

impl TaskOrchestrator {
    pub fn new(
        store: Arc<dyn TaskStore>,
        bus: Arc<dyn EventBus>,
        planner: Arc<dyn Planner>,
        scheduler: Arc<dyn Scheduler>,
        checkpoints: Arc<dyn CheckpointManager>,
        max_planning_retries: u32,
    ) -> Self {
        Self { store, bus, planner, scheduler, checkpoints, max_planning_retries, leases: TaskLeases::new() }
    }

    async fn publish(&self, event_type: &str, task_id: &TaskId, payload: HashMap<String, serde_json::Value>) {
        let mut event = Event::new("orchestrator", EventSourceType::Orchestrator, event_type).for_task(task_id);
        event.payload = payload;
        // Event delivery is best-effort from the orchestrator's point of view:
        // a publish failure must not unwind a state transition that already
        // committed to the store.
        let _ = self.bus.publish(event).await;
    }

    /// `DRAFT → PLANNING → READY`, or `PLANNING → FAILED` on exhausted
    /// planner retries. Persists the proposed steps once validated.
    async fn plan(&self, task: &Task) -> TaskCoreResult<Task> {
        let planning = self
            .store
            .update_task(
                &task.id,
                task.version,
                taskcore_kernel::traits::TaskPatch { status: Some(TaskStatus::Planning), ..Default::default() },
            )
            .await?;

        let mut last_error = None;
        for _ in 0..=self.max_planning_retries {
            match self.planner.plan(&planning).await {
                Ok(proposal) => {
                    let ready = self
                        .store
                        .update_task(
                            &planning.id,
                            planning.version,
                            taskcore_kernel::traits::TaskPatch {
                                status: Some(TaskStatus::Ready),
                                steps: Some(proposal.steps),
                                ..Default::default()
                            },
                        )
                        .await?;
                    self.publish(event_types::TASK_PLANNED, &ready.id, HashMap::new()).await;
                    return Ok(ready);
                }
                Err(e) => last_error = Some(e),
            }
        }

        let failed = self
            .store
            .update_task(
                &planning.id,
                planning.version,
                taskcore_kernel::traits::TaskPatch {
                    status: Some(TaskStatus::Failed),
                    completed_at: Some(Some(chrono::Utc::now())),
                    ..Default::default()
                },
            )
            .await?;
        self.publish(event_types::TASK_FAILED, &failed.id, HashMap::new()).await;
        Err(last_error.unwrap_or_else(|| TaskCoreError::PlannerError("planning failed".to_string())))
    }

    /// Repeated `schedule_ready_nodes` passes until the task reaches a
    /// terminal status or is left waiting on a checkpoint/replan.
    async fn drive(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        let lease = self.leases.lease(task_id);
        let _guard = lease.lock().await;

        let mut task = self.store.get_task(task_id).await?;
        if task.status == TaskStatus::Ready {
            task = self
                .store
                .update_task(
                    &task.id,
                    task.version,
                    taskcore_kernel::traits::TaskPatch { status: Some(TaskStatus::Running), ..Default::default() },
                )
                .await?;
            self.publish(event_types::TASK_STARTED, &task.id, HashMap::new()).await;
        }

        loop {
            if task.status.is_terminal() {
                return Ok(task);
            }

            if let Some(trigger) = task.findings.iter().find(|f| f.is_replan_request()).cloned() {
                task = self
                    .store
                    .update_task(
                        &task.id,
                        task.version,
                        taskcore_kernel::traits::TaskPatch { status: Some(TaskStatus::Replanning), ..Default::default() },
                    )
                    .await?;
                self.publish(event_types::TASK_REPLANNING, &task.id, HashMap::new()).await;

                let proposal = self.planner.replan(&task, &trigger).await?;
                let remaining_findings: Vec<_> = task.findings.iter().filter(|f| !f.is_replan_request()).cloned().collect();
                task = self
                    .store
                    .update_task(
                        &task.id,
                        task.version,
                        taskcore_kernel::traits::TaskPatch {
                            status: Some(TaskStatus::Running),
                            steps: Some(proposal.steps),
                            findings: Some(remaining_findings),
                            ..Default::default()
                        },
                    )
                    .await?;
                continue;
            }

            let scheduled = self.scheduler.schedule_ready_nodes(&task).await?;
            task = self
                .store
                .update_task(
                    &task.id,
                    task.version,
                    taskcore_kernel::traits::TaskPatch {
                        steps: Some(scheduled.steps),
                        status: Some(scheduled.status),
                        ..Default::default()
                    },
                )
                .await?;

            if task.status == TaskStatus::WaitingApproval {
                return Ok(task);
            }

            if task.all_steps_terminal() {
                let newly_failed = task.steps.iter().any(|s| s.status == taskcore_kernel::domain::StepStatus::Failed);
                task = if newly_failed {
                    let mut t = task;
                    t.mark_failed();
                    let t = self
                        .store
                        .update_task(
                            &t.id,
                            t.version,
                            taskcore_kernel::traits::TaskPatch {
                                status: Some(TaskStatus::Failed),
                                completed_at: Some(t.completed_at),
                                ..Default::default()
                            },
                        )
                        .await?;
                    self.publish(event_types::TASK_FAILED, &t.id, HashMap::new()).await;
                    t
                } else {
                    let mut t = task;
                    t.mark_completed();
                    let t = self
                        .store
                        .update_task(
                            &t.id,
                            t.version,
                            taskcore_kernel::traits::TaskPatch {
                                status: Some(TaskStatus::Completed),
                                completed_at: Some(t.completed_at),
                                ..Default::default()
                            },
                        )
                        .await?;
                    self.publish(event_types::TASK_COMPLETED, &t.id, HashMap::new()).await;
                    t
                };
                return Ok(task);
            }

            // No step made progress this pass and none are waiting on a
            // checkpoint or replan: nothing left to admit, stop here rather
            // than spin (a malformed plan with an unsatisfiable dependency
            // would otherwise loop forever).
            let ready_exists = task.steps.iter().any(|s| {
                matches!(s.status, taskcore_kernel::domain::StepStatus::Pending | taskcore_kernel::domain::StepStatus::Ready)
            });
            if !ready_exists {
                return Ok(task);
            }
        }
    }
}

#[async_trait]
impl taskcore_kernel::traits::Orchestrator for TaskOrchestrator {
    async fn run(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        let task = self.store.get_task(task_id).await?;
        let task = if task.status == TaskStatus::Draft { self.plan(&task).await? } else { task };
        self.drive(&task.id).await
    }

    async fn resume(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        self.drive(task_id).await
    }

    async fn replan(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        let task = self.store.get_task(task_id).await?;
        let finding = task
            .findings
            .iter()
            .find(|f| f.is_replan_request())
            .cloned()
            .unwrap_or_else(|| taskcore_kernel::domain::Finding::replan_requested("", "manual replan requested"));
        let proposal = self.planner.replan(&task, &finding).await?;
        self.store
            .update_task(
                &task.id,
                task.version,
                taskcore_kernel::traits::TaskPatch {
                    status: Some(TaskStatus::Running),
                    steps: Some(proposal.steps),
                    ..Default::default()
                },
            )
            .await?;
        self.drive(task_id).await
    }

    /// Sets the task terminal, resolves any pending checkpoint as rejected
    /// with reason `cancelled` (spec §5). Running steps are not force-killed
    /// here — cooperative cancellation through `TaskContext` is the
    /// dispatcher's responsibility; this call guarantees the task aggregate
    /// itself lands in `CANCELLED` and stops admitting new steps.
    async fn cancel(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        let lease = self.leases.lease(task_id);
        let _guard = lease.lock().await;

        let task = self.store.get_task(task_id).await?;
        if task.status.is_terminal() {
            return Ok(task);
        }

        for pending in self.checkpoints.get_pending(task_id).await? {
            let _ = self
                .checkpoints
                .resolve_checkpoint(
                    task_id,
                    &pending.step_id,
                    taskcore_kernel::domain::CheckpointDecision::Rejected,
                    Some(taskcore_kernel::domain::CheckpointResponse { feedback: Some("cancelled".to_string()), ..Default::default() }),
                    None,
                )
                .await;
        }

        let mut cancelled = task;
        cancelled.mark_cancelled();
        let cancelled = self
            .store
            .update_task(
                &cancelled.id,
                cancelled.version,
                taskcore_kernel::traits::TaskPatch {
                    status: Some(TaskStatus::Cancelled),
                    completed_at: Some(cancelled.completed_at),
                    ..Default::default()
                },
            )
            .await?;
        self.publish(event_types::TASK_CANCELLED, &cancelled.id, HashMap::new()).await;
        Ok(cancelled)
    }
}
