//! Wires an in-process `UseCases` stack and drives one task from creation to
//! a terminal status, grounded on the `taskcore-foundation` usecases test
//! wiring (the same store/bus/checkpoint/dispatcher/scheduler/orchestrator
//! assembly, exposed here instead of behind `#[cfg(test)]`).

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use taskcore_foundation::{
    with_builtin_plugins, DefaultStepDispatcher, InMemoryCheckpointManager, InMemoryEventBus, InMemoryTaskStore, LlmPlanner,
    TaskOrchestrator, TokioScheduler, UseCases,
};
use taskcore_foundation::dispatcher::StubFileService;
use taskcore_foundation::planner::{HttpLLMProvider, StaticLLMProvider};
use taskcore_foundation::plugins::RecordingNotificationProvider;
use taskcore_kernel::config::CoreConfig;
use taskcore_kernel::domain::{CheckpointDecision, Constraints, Task, TaskOwner, TaskStatus};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{CheckpointManager, EventBus, LLMProvider, Orchestrator, Planner, Scheduler, TaskStore};

pub struct RunOptions {
    pub goal: String,
    pub constraints: Constraints,
    pub auto_approve: bool,
    pub planner_endpoint: Option<String>,
    pub planner_model: Option<String>,
    pub planner_api_key: Option<String>,
}

/// Builds the use-case stack from `CoreConfig::from_env()` plus CLI overrides.
/// Without a `planner_endpoint` the CLI falls back to a static planner that
/// always proposes a single `send_email` step, useful for exercising the
/// dispatcher/checkpoint flow against the built-in plugins without a live
/// model.
fn build_use_cases(config: &CoreConfig, options: &RunOptions) -> (UseCases, Arc<dyn CheckpointManager>) {
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(Duration::from_secs(config.cache_ttl_seconds)));
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new(config.event_replay_log_size));
    let checkpoints: Arc<dyn CheckpointManager> =
        Arc::new(InMemoryCheckpointManager::new(store.clone(), config.checkpoint_default_expiry_seconds));
    let plugins = Arc::new(with_builtin_plugins(Arc::new(RecordingNotificationProvider::new())));
    let files = Arc::new(StubFileService::new());
    let dispatcher = Arc::new(DefaultStepDispatcher::new(plugins, checkpoints.clone(), None, files, Vec::new()));
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(dispatcher, bus.clone(), config.worker_pool_size));

    let llm: Arc<dyn LLMProvider> = match &options.planner_endpoint {
        Some(endpoint) => {
            let model = options.planner_model.clone().or_else(|| config.planner_model.clone()).unwrap_or_else(|| "gpt-4".to_string());
            Arc::new(HttpLLMProvider::new(endpoint.clone(), model, options.planner_api_key.clone()))
        }
        None => Arc::new(StaticLLMProvider::new(
            r#"[{"id": "s1", "name": "notify", "kind": "plugin", "plugin_namespace": "send_email", "depends_on": [], "inputs": {"to": "ops@example.com"}}]"#,
        )),
    };
    let planner: Arc<dyn Planner> = Arc::new(LlmPlanner::new(llm, config.planner_max_validation_retries));
    let orchestrator: Arc<dyn Orchestrator> =
        Arc::new(TaskOrchestrator::new(store.clone(), bus, planner, scheduler, checkpoints.clone(), config.task_default_concurrency));

    (UseCases::new(store, orchestrator, checkpoints.clone()), checkpoints)
}

/// Prompts on stdin for each pending checkpoint (unless `auto_approve`),
/// resolving it and resuming the orchestrator, until the task reaches a
/// terminal status.
pub async fn run_to_completion(options: RunOptions) -> TaskCoreResult<Task> {
    let config = CoreConfig::from_env().unwrap_or_default();
    let (use_cases, checkpoints) = build_use_cases(&config, &options);

    let owner = TaskOwner { user_id: "cli".to_string(), organization_id: "cli".to_string() };
    let mut task = use_cases.create_task(owner, options.goal.clone(), options.constraints.clone(), true).await?;

    while task.status == TaskStatus::WaitingApproval {
        let pending = checkpoints.get_pending(&task.id).await?;
        for checkpoint in pending {
            let decision = if options.auto_approve {
                CheckpointDecision::Approved
            } else {
                prompt_decision(&checkpoint.step_id, &checkpoint.prompt)
            };
            task = use_cases.resume_checkpoint(&task.id, &checkpoint.step_id, decision, None, Some("cli".to_string())).await?;
        }
        if task.status == TaskStatus::WaitingApproval {
            // No fresh pending checkpoints surfaced this pass but the task is
            // still waiting; avoid spinning forever.
            break;
        }
    }

    Ok(task)
}

fn prompt_decision(step_id: &str, prompt: &str) -> CheckpointDecision {
    print!("checkpoint on step {step_id}: {prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return CheckpointDecision::Rejected;
    }
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => CheckpointDecision::Approved,
        _ => CheckpointDecision::Rejected,
    }
}

pub fn parse_constraints(raw: Option<&str>) -> TaskCoreResult<Constraints> {
    match raw {
        None => Ok(Constraints::new()),
        Some(s) => serde_json::from_str(s).map_err(|e| TaskCoreError::invalid_input(format!("invalid --constraints JSON: {e}"))),
    }
}
