//! C6 — Step Dispatcher, grounded on
//! `mofa-foundation/src/llm/planning_executor.rs`'s `execute_single_step`
//! shape: resolve inputs, run the step's kind, return a terminal outcome.

mod branch;
mod references;
mod schema;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taskcore_kernel::domain::{Step, StepKind, Task};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{CheckpointManager, DispatchOutcome, FileService, LLMProvider, PluginRegistry, StepDispatcher, TaskContext};

pub use branch::evaluate_branch;
pub use references::resolve_inputs;

pub struct DefaultStepDispatcher {
    plugins: Arc<dyn PluginRegistry>,
    checkpoints: Arc<dyn CheckpointManager>,
    llm: Option<Arc<dyn LLMProvider>>,
    files: Arc<dyn FileService>,
    org_default_hosts: Vec<String>,
}

impl DefaultStepDispatcher {
    pub fn new(
        plugins: Arc<dyn PluginRegistry>,
        checkpoints: Arc<dyn CheckpointManager>,
        llm: Option<Arc<dyn LLMProvider>>,
        files: Arc<dyn FileService>,
        org_default_hosts: Vec<String>,
    ) -> Self {
        Self { plugins, checkpoints, llm, files, org_default_hosts }
    }

    async fn dispatch_plugin(&self, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome> {
        let namespace = step
            .plugin_namespace
            .as_deref()
            .ok_or_else(|| TaskCoreError::invalid_input("plugin step missing plugin_namespace"))?;
        let (spec, executor) = self.plugins.get(namespace)?;

        let mut inputs = resolve_inputs(&step.inputs, task)?;
        schema::validate_inputs(&spec, &inputs)?;

        if spec.requires_checkpoint {
            if let Some(outcome) = self.gate_on_checkpoint(task, step).await? {
                return Ok(outcome);
            }
        }

        inputs.insert(
            "__allowed_hosts".to_string(),
            serde_json::json!(task.effective_allowed_hosts(&self.org_default_hosts)),
        );

        for reference in task.constraints.file_references() {
            let _ = self.files.resolve(&reference).await?;
        }

        let ctx = TaskContext::new(task.id.clone(), step.id.clone(), step.attempts + 1);
        match executor.execute(&ctx, inputs).await {
            Ok(output) => Ok(DispatchOutcome::Succeeded { output }),
            Err(e) => Ok(DispatchOutcome::Failed { kind: e.kind().to_string(), message: e.to_string() }),
        }
    }

    async fn dispatch_llm_agent(&self, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome> {
        let llm = self.llm.as_ref().ok_or_else(|| TaskCoreError::invalid_input("no LLMProvider configured"))?;
        let agent_spec = step.agent_spec.as_deref().unwrap_or("default");
        let inputs = resolve_inputs(&step.inputs, task)?;
        let prompt = serde_json::to_string(&inputs)?;

        match llm.complete(&format!("You are the {agent_spec} agent."), &prompt).await {
            Ok(response) => {
                let mut output = HashMap::new();
                output.insert("response".to_string(), serde_json::json!(response));
                Ok(DispatchOutcome::Succeeded { output })
            }
            Err(e) => Ok(DispatchOutcome::Failed { kind: e.kind().to_string(), message: e.to_string() }),
        }
    }

    async fn dispatch_checkpoint(&self, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome> {
        match self.gate_on_checkpoint(task, step).await? {
            Some(outcome) => Ok(outcome),
            None => Ok(DispatchOutcome::Succeeded { output: HashMap::new() }),
        }
    }

    /// Shared checkpoint gate for `Plugin` steps with `requires_checkpoint`
    /// and dedicated `Checkpoint` steps. Returns `Some(outcome)` when the
    /// step must stop here (still pending, rejected/expired, or newly
    /// created); `None` means the checkpoint is resolved favorably and the
    /// caller should proceed with the step's own work.
    async fn gate_on_checkpoint(&self, task: &Task, step: &Step) -> TaskCoreResult<Option<DispatchOutcome>> {
        use taskcore_kernel::domain::CheckpointDecision;

        if let Some(existing) = self.checkpoints.get_resolution(&task.id, &step.id).await? {
            return Ok(match existing.decision {
                CheckpointDecision::Pending => Some(DispatchOutcome::AwaitingCheckpoint),
                CheckpointDecision::Approved | CheckpointDecision::AutoApproved => None,
                CheckpointDecision::Rejected | CheckpointDecision::Expired => Some(DispatchOutcome::Failed {
                    kind: "checkpoint_rejected".to_string(),
                    message: format!("checkpoint for step {} was not approved: {:?}", step.id, existing.decision),
                }),
            });
        }

        let descriptor = step.checkpoint.clone().unwrap_or_default();
        if let Some(checkpoint) = self.checkpoints.try_auto_decide(&task.id, &step.id, &descriptor).await? {
            if checkpoint.decision == CheckpointDecision::AutoApproved {
                return Ok(None);
            }
            return Ok(Some(DispatchOutcome::AwaitingCheckpoint));
        }

        self.checkpoints.create_checkpoint(&task.id, &step.id, &descriptor).await?;
        Ok(Some(DispatchOutcome::AwaitingCheckpoint))
    }

    fn dispatch_branch(&self, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome> {
        let expression = step
            .branch_expression
            .as_deref()
            .ok_or_else(|| TaskCoreError::invalid_input("branch step missing branch_expression"))?;
        let took_true_branch = evaluate_branch(expression, task)?;

        let key = if took_true_branch { "on_true" } else { "on_false" };
        let active_step_ids: Vec<String> = step
            .inputs
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Ok(DispatchOutcome::BranchTaken { active_step_ids })
    }
}

#[async_trait]
impl StepDispatcher for DefaultStepDispatcher {
    async fn dispatch(&self, _ctx: &TaskContext, task: &Task, step: &Step) -> TaskCoreResult<DispatchOutcome> {
        match step.kind {
            StepKind::Plugin => self.dispatch_plugin(task, step).await,
            StepKind::LlmAgent => self.dispatch_llm_agent(task, step).await,
            StepKind::Checkpoint => self.dispatch_checkpoint(task, step).await,
            StepKind::Branch => self.dispatch_branch(task, step),
        }
    }
}

/// In-memory `FileService` stub: object storage itself is out of scope, but
/// the dispatcher's cap-enforcement logic against resolved file context must
/// still be testable.
pub struct StubFileService {
    known: HashMap<String, taskcore_kernel::traits::FileContext>,
}

impl StubFileService {
    pub fn new() -> Self {
        Self { known: HashMap::new() }
    }

    pub fn register(&mut self, reference: impl Into<String>, context: taskcore_kernel::traits::FileContext) {
        self.known.insert(reference.into(), context);
    }
}

impl Default for StubFileService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileService for StubFileService {
    async fn resolve(&self, reference: &serde_json::Value) -> TaskCoreResult<taskcore_kernel::traits::FileContext> {
        let key = reference.as_str().unwrap_or_default();
        self.known
            .get(key)
            .map(|ctx| taskcore_kernel::traits::FileContext {
                content_type: ctx.content_type.clone(),
                size_bytes: ctx.size_bytes,
                classification: ctx.classification.clone(),
            })
            .ok_or_else(|| TaskCoreError::not_found(format!("file reference {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointManager;
    use crate::plugins::{with_builtin_plugins, RecordingNotificationProvider};
    use crate::store::InMemoryTaskStore;
    use std::time::Duration;
    use taskcore_kernel::domain::{StepKind, TaskOwner};
    use taskcore_kernel::traits::TaskStore;

    async fn dispatcher_with_builtin_plugins() -> (DefaultStepDispatcher, Arc<dyn TaskStore>) {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(Duration::from_secs(600)));
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        store.create_task(Task::new("t1", owner, "goal")).await.unwrap();

        let plugins = Arc::new(with_builtin_plugins(Arc::new(RecordingNotificationProvider::new())));
        let checkpoints = Arc::new(InMemoryCheckpointManager::new(store.clone(), 86_400));
        let files = Arc::new(StubFileService::new());
        (DefaultStepDispatcher::new(plugins, checkpoints, None, files, Vec::new()), store)
    }

    #[tokio::test]
    async fn transform_plugin_dispatches_and_succeeds() {
        let (dispatcher, store) = dispatcher_with_builtin_plugins().await;
        let task = store.get_task(&"t1".to_string()).await.unwrap();
        let mut step = Step::new("s1", "upper", StepKind::Plugin);
        step.plugin_namespace = Some("transform".to_string());
        step.inputs.insert("operation".to_string(), serde_json::json!("to_upper"));
        step.inputs.insert("data".to_string(), serde_json::json!("hi"));

        let ctx = TaskContext::new("t1", "s1", 1);
        let outcome = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        match outcome {
            DispatchOutcome::Succeeded { output } => assert_eq!(output["result"], serde_json::json!("HI")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_email_requests_a_checkpoint_instead_of_sending() {
        let (dispatcher, store) = dispatcher_with_builtin_plugins().await;
        let task = store.get_task(&"t1".to_string()).await.unwrap();
        let mut step = Step::new("s1", "notify", StepKind::Plugin);
        step.plugin_namespace = Some("send_email".to_string());
        step.inputs.insert("to".to_string(), serde_json::json!("ops@example.com"));

        let ctx = TaskContext::new("t1", "s1", 1);
        let outcome = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::AwaitingCheckpoint));
    }

    #[tokio::test]
    async fn approved_checkpoint_lets_a_resumed_plugin_step_proceed() {
        let (dispatcher, store) = dispatcher_with_builtin_plugins().await;
        let task = store.get_task(&"t1".to_string()).await.unwrap();
        let mut step = Step::new("s1", "notify", StepKind::Plugin);
        step.plugin_namespace = Some("send_email".to_string());
        step.inputs.insert("to".to_string(), serde_json::json!("ops@example.com"));

        let ctx = TaskContext::new("t1", "s1", 1);
        let first = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        assert!(matches!(first, DispatchOutcome::AwaitingCheckpoint));

        dispatcher
            .checkpoints
            .resolve_checkpoint("t1", "s1", taskcore_kernel::domain::CheckpointDecision::Approved, None, Some("u1".into()))
            .await
            .unwrap();

        let resumed = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        assert!(matches!(resumed, DispatchOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn rejected_checkpoint_surfaces_as_a_failed_outcome_on_redispatch() {
        let (dispatcher, store) = dispatcher_with_builtin_plugins().await;
        let task = store.get_task(&"t1".to_string()).await.unwrap();
        let mut step = Step::new("s1", "notify", StepKind::Plugin);
        step.plugin_namespace = Some("send_email".to_string());
        step.inputs.insert("to".to_string(), serde_json::json!("ops@example.com"));

        let ctx = TaskContext::new("t1", "s1", 1);
        dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        dispatcher
            .checkpoints
            .resolve_checkpoint("t1", "s1", taskcore_kernel::domain::CheckpointDecision::Rejected, None, Some("u1".into()))
            .await
            .unwrap();

        let resumed = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        assert!(matches!(resumed, DispatchOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn branch_step_selects_the_true_or_false_branch() {
        let (dispatcher, store) = dispatcher_with_builtin_plugins().await;
        let task = store.get_task(&"t1".to_string()).await.unwrap();
        let mut step = Step::new("s1", "decide", StepKind::Branch);
        step.branch_expression = Some("true".to_string());
        step.inputs.insert("on_true".to_string(), serde_json::json!(["a", "b"]));
        step.inputs.insert("on_false".to_string(), serde_json::json!(["c"]));

        let ctx = TaskContext::new("t1", "s1", 1);
        let outcome = dispatcher.dispatch(&ctx, &task, &step).await.unwrap();
        match outcome {
            DispatchOutcome::BranchTaken { active_step_ids } => {
                assert_eq!(active_step_ids, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
