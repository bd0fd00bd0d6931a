//! C5 — Planner: turns a task's goal/constraints into a validated step DAG.
//! Grounded on `mofa-foundation/src/llm/llm_planner.rs`'s prompt-and-parse
//! loop (propose → validate → reprompt on failure up to N times).

mod provider;

pub use provider::{HttpLLMProvider, StaticLLMProvider};

use async_trait::async_trait;
use taskcore_kernel::domain::{dag, Finding, Step, Task};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{LLMProvider, PlanProposal, Planner};

pub struct LlmPlanner {
    llm: std::sync::Arc<dyn LLMProvider>,
    max_validation_retries: u32,
}

impl LlmPlanner {
    pub fn new(llm: std::sync::Arc<dyn LLMProvider>, max_validation_retries: u32) -> Self {
        Self { llm, max_validation_retries }
    }

    fn system_prompt() -> &'static str {
        "You are the planning agent for a task orchestration system. Given a \
         goal, constraints, and success criteria, respond with a JSON array \
         of step objects. Each step has: id, name, kind (plugin|llm_agent| \
         checkpoint|branch), plugin_namespace (when kind is plugin), \
         depends_on (array of step ids), inputs (object). Respond with JSON \
         only, no prose."
    }

    fn user_prompt(task: &Task, replan_reason: Option<&str>) -> String {
        let mut prompt = format!(
            "Goal: {}\nSuccess criteria: {:?}\nConstraints: {:?}",
            task.goal, task.success_criteria, task.constraints
        );
        if let Some(reason) = replan_reason {
            prompt.push_str(&format!("\n\nA replan was requested: {reason}"));
            let succeeded: Vec<&str> = task
                .steps
                .iter()
                .filter(|s| s.status.is_success())
                .map(|s| s.id.as_str())
                .collect();
            prompt.push_str(&format!("\nAlready-succeeded steps (preserve their outputs): {succeeded:?}"));
        }
        prompt
    }

    fn parse_steps(raw: &str) -> TaskCoreResult<Vec<Step>> {
        let trimmed = raw.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
        serde_json::from_str(trimmed).map_err(|e| TaskCoreError::PlannerError(format!("could not parse plan: {e}")))
    }

    async fn propose(&self, task: &Task, replan_reason: Option<&str>) -> TaskCoreResult<Vec<Step>> {
        let mut last_error = None;
        for attempt in 0..=self.max_validation_retries {
            let mut prompt = Self::user_prompt(task, replan_reason);
            if let Some(err) = &last_error {
                prompt.push_str(&format!("\n\nThe previous attempt (#{attempt}) was invalid: {err}. Fix it."));
            }
            let raw = self.llm.complete(Self::system_prompt(), &prompt).await?;
            match Self::parse_steps(&raw).and_then(|steps| {
                dag::validate(&steps)?;
                Ok(steps)
            }) {
                Ok(steps) => return Ok(steps),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
        Err(TaskCoreError::PlannerError(format!(
            "planner failed validation after {} attempts: {}",
            self.max_validation_retries + 1,
            last_error.unwrap_or_default()
        )))
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, task: &Task) -> TaskCoreResult<PlanProposal> {
        let steps = self.propose(task, None).await?;
        Ok(PlanProposal { steps, rationale: None })
    }

    async fn replan(&self, task: &Task, trigger: &Finding) -> TaskCoreResult<PlanProposal> {
        let mut steps = self.propose(task, Some(&trigger.content)).await?;

        // Carry forward already-succeeded step outputs (Open Question 1):
        // any proposed step whose id matches a previously-succeeded step is
        // replaced wholesale by the original, completed step.
        for step in steps.iter_mut() {
            if let Some(old) = task.get_step(&step.id) {
                if old.status.is_success() {
                    *step = old.clone();
                }
            }
        }

        Ok(PlanProposal { steps, rationale: Some(format!("replanned: {}", trigger.content)) })
    }
}
