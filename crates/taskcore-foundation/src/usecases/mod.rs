//! C9 — Use Cases: thin application-layer transactions composing the
//! orchestrator, checkpoint manager, and task store. Grounded on
//! `mofa-foundation/src/llm/task_orchestrator.rs`'s public entry points,
//! generalized to the five flows spec §4.9 names.

use std::sync::Arc;

use taskcore_kernel::domain::{CheckpointDecision, CheckpointResponse, Constraints, Task, TaskId, TaskOwner, TaskStatus};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{CheckpointManager, Orchestrator, TaskPatch, TaskStore};

pub struct UseCases {
    store: Arc<dyn TaskStore>,
    orchestrator: Arc<dyn Orchestrator>,
    checkpoints: Arc<dyn CheckpointManager>,
}

impl UseCases {
    pub fn new(store: Arc<dyn TaskStore>, orchestrator: Arc<dyn Orchestrator>, checkpoints: Arc<dyn CheckpointManager>) -> Self {
        Self { store, orchestrator, checkpoints }
    }

    /// Persists a new task in `DRAFT`, then plans and runs it if
    /// `auto_start` is set.
    pub async fn create_task(
        &self,
        owner: TaskOwner,
        goal: impl Into<String>,
        constraints: Constraints,
        auto_start: bool,
    ) -> TaskCoreResult<Task> {
        let mut task = Task::new(uuid::Uuid::new_v4().to_string(), owner, goal);
        task.constraints = constraints;
        let created = self.store.create_task(task).await?;

        if auto_start {
            self.orchestrator.run(&created.id).await
        } else {
            Ok(created)
        }
    }

    /// Validates the task is in a startable state, then hands off to the
    /// orchestrator's plan/run path.
    pub async fn start_task(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        let task = self.store.get_task(task_id).await?;
        if !matches!(task.status, TaskStatus::Draft | TaskStatus::Ready) {
            return Err(TaskCoreError::invalid_input(format!("task {task_id} is not in a startable state: {:?}", task.status)));
        }
        self.orchestrator.run(task_id).await
    }

    /// Resolves a pending checkpoint; on approval the gated step is put back
    /// up for scheduling and the scheduler resumes, on rejection the step is
    /// failed outright (spec §4.9).
    pub async fn resume_checkpoint(
        &self,
        task_id: &TaskId,
        step_id: &str,
        decision: CheckpointDecision,
        response: Option<CheckpointResponse>,
        decided_by: Option<String>,
    ) -> TaskCoreResult<Task> {
        self.checkpoints.resolve_checkpoint(task_id, step_id, decision, response, decided_by).await?;

        let task = self.store.get_task(task_id).await?;
        let mut steps = task.steps.clone();
        let Some(step) = steps.iter_mut().find(|s| s.id == step_id) else {
            return Err(TaskCoreError::not_found(format!("step {step_id} on task {task_id}")));
        };

        match decision {
            CheckpointDecision::Approved | CheckpointDecision::AutoApproved => {
                step.status = taskcore_kernel::domain::StepStatus::Pending;
            }
            CheckpointDecision::Rejected | CheckpointDecision::Expired => {
                step.mark_failed("checkpoint_rejected", "checkpoint was rejected");
            }
            CheckpointDecision::Pending => {
                return Err(TaskCoreError::invalid_input("cannot resume a checkpoint with decision Pending"));
            }
        }

        self.store.update_task(task_id, task.version, TaskPatch { steps: Some(steps), ..Default::default() }).await?;
        self.orchestrator.resume(task_id).await
    }

    pub async fn cancel_task(&self, task_id: &TaskId) -> TaskCoreResult<Task> {
        self.orchestrator.cancel(task_id).await
    }

    /// Records the conversation id in task metadata so a conversation view
    /// can follow the task's progress; no state-machine transition.
    pub async fn link_conversation(&self, task_id: &TaskId, conversation_id: impl Into<String>) -> TaskCoreResult<Task> {
        let task = self.store.get_task(task_id).await?;
        let mut metadata = task.metadata.clone();
        metadata.insert("conversation_id".to_string(), serde_json::json!(conversation_id.into()));
        self.store.update_task(task_id, task.version, TaskPatch { metadata: Some(metadata), ..Default::default() }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryEventBus;
    use crate::checkpoint::InMemoryCheckpointManager;
    use crate::dispatcher::{DefaultStepDispatcher, StubFileService};
    use crate::orchestrator::TaskOrchestrator;
    use crate::planner::{LlmPlanner, StaticLLMProvider};
    use crate::plugins::{with_builtin_plugins, RecordingNotificationProvider};
    use crate::scheduler::TokioScheduler;
    use crate::store::InMemoryTaskStore;
    use std::time::Duration;
    use taskcore_kernel::traits::{EventBus, Planner, Scheduler};

    fn use_cases() -> (UseCases, Arc<dyn TaskStore>) {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(Duration::from_secs(600)));
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new(1000));
        let checkpoints: Arc<dyn CheckpointManager> = Arc::new(InMemoryCheckpointManager::new(store.clone(), 86_400));
        let plugins = Arc::new(with_builtin_plugins(Arc::new(RecordingNotificationProvider::new())));
        let files = Arc::new(StubFileService::new());
        let dispatcher = Arc::new(DefaultStepDispatcher::new(plugins, checkpoints.clone(), None, files, Vec::new()));
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(dispatcher, bus.clone(), 4));
        let llm = Arc::new(StaticLLMProvider::new(
            r#"[{"id": "s1", "name": "notify", "kind": "plugin", "plugin_namespace": "send_email", "depends_on": [], "inputs": {"to": "ops@example.com"}}]"#,
        ));
        let planner: Arc<dyn Planner> = Arc::new(LlmPlanner::new(llm, 2));
        let orchestrator: Arc<dyn Orchestrator> = Arc::new(TaskOrchestrator::new(store.clone(), bus, planner, scheduler, checkpoints.clone(), 2));
        (UseCases::new(store.clone(), orchestrator, checkpoints), store)
    }

    #[tokio::test]
    async fn create_task_with_auto_start_runs_until_it_waits_on_a_checkpoint() {
        let (uc, _store) = use_cases();
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let task = uc.create_task(owner, "notify ops", Constraints::new(), true).await.unwrap();
        assert_eq!(task.status, TaskStatus::WaitingApproval);
        assert_eq!(task.get_step("s1").unwrap().status, taskcore_kernel::domain::StepStatus::WaitingApproval);
    }

    #[tokio::test]
    async fn resume_checkpoint_with_approval_completes_the_task() {
        let (uc, _store) = use_cases();
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let task = uc.create_task(owner, "notify ops", Constraints::new(), true).await.unwrap();
        assert_eq!(task.status, TaskStatus::WaitingApproval);

        let resumed = uc.resume_checkpoint(&task.id, "s1", CheckpointDecision::Approved, None, Some("u1".into())).await.unwrap();
        assert_eq!(resumed.status, TaskStatus::Completed);
        assert_eq!(resumed.get_step("s1").unwrap().status, taskcore_kernel::domain::StepStatus::Succeeded);
    }

    #[tokio::test]
    async fn resume_checkpoint_with_rejection_fails_the_task() {
        let (uc, _store) = use_cases();
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let task = uc.create_task(owner, "notify ops", Constraints::new(), true).await.unwrap();

        let resumed = uc.resume_checkpoint(&task.id, "s1", CheckpointDecision::Rejected, None, None).await.unwrap();
        assert_eq!(resumed.status, TaskStatus::Failed);
        assert_eq!(resumed.get_step("s1").unwrap().status, taskcore_kernel::domain::StepStatus::Failed);
    }

    #[tokio::test]
    async fn link_conversation_records_the_id_in_metadata() {
        let (uc, store) = use_cases();
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        store.create_task(Task::new("t1", owner, "goal")).await.unwrap();

        let updated = uc.link_conversation(&"t1".to_string(), "conv-42").await.unwrap();
        assert_eq!(updated.metadata["conversation_id"], serde_json::json!("conv-42"));
    }

    #[tokio::test]
    async fn start_task_rejects_a_task_that_is_already_running() {
        let (uc, store) = use_cases();
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let mut task = Task::new("t1", owner, "goal");
        task.status = TaskStatus::Running;
        store.create_task(task).await.unwrap();

        assert!(uc.start_task(&"t1".to_string()).await.is_err());
    }
}
