//! The Task aggregate: a single run of a goal, its constraints, and its plan.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;
use super::step::Step;

/// Opaque task identifier (a UUID in string form, but callers should not
/// assume UUID structure — only stable string identity).
pub type TaskId = String;

/// `Task::status` — see spec §4.8 for the full transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Draft,
    Planning,
    Ready,
    Running,
    WaitingApproval,
    Replanning,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Scalar/list constraint values accepted in `Task::constraints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Scalar(serde_json::Value),
    List(Vec<serde_json::Value>),
}

/// Known constraint keys are read through typed accessors; unknown keys pass
/// through untouched so planners can carry forward org-specific knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(flatten)]
    pub values: HashMap<String, ConstraintValue>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn budget_usd(&self) -> Option<f64> {
        match self.values.get("budget_usd") {
            Some(ConstraintValue::Scalar(v)) => v.as_f64(),
            _ => None,
        }
    }

    pub fn time_limit_seconds(&self) -> Option<u64> {
        match self.values.get("time_limit_seconds") {
            Some(ConstraintValue::Scalar(v)) => v.as_u64(),
            _ => None,
        }
    }

    pub fn allowed_hosts(&self) -> Vec<String> {
        match self.values.get("allowed_hosts") {
            Some(ConstraintValue::List(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn file_references(&self) -> Vec<serde_json::Value> {
        match self.values.get("file_references") {
            Some(ConstraintValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Who or what caused a task run to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    Api,
    Schedule,
    Replan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOwner {
    pub user_id: String,
    pub organization_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub version: u64,
    pub owner: TaskOwner,
    pub goal: String,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub current_step_index: usize,
    pub status: TaskStatus,
    pub tree_id: String,
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub run_number: u32,
    #[serde(default = "default_triggered_by")]
    pub triggered_by: TriggeredBy,
    #[serde(default)]
    pub total_runs: u32,
    #[serde(default)]
    pub successful_runs: u32,
    #[serde(default)]
    pub failed_runs: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_triggered_by() -> TriggeredBy {
    TriggeredBy::Api
}

impl Task {
    /// Construct a brand-new task in `DRAFT` with version 0. Callers go
    /// through the Create-Task use case, which is the only place a task's
    /// initial persisted version (1, after the store's first write) is set.
    pub fn new(id: impl Into<TaskId>, owner: TaskOwner, goal: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            version: 0,
            owner,
            goal: goal.into(),
            constraints: Constraints::new(),
            success_criteria: Vec::new(),
            steps: Vec::new(),
            findings: Vec::new(),
            current_step_index: 0,
            status: TaskStatus::Draft,
            tree_id: uuid::Uuid::new_v4().to_string(),
            parent_task_id: None,
            metadata: HashMap::new(),
            run_number: 1,
            triggered_by: TriggeredBy::Api,
            total_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn get_step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn get_step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    /// `status == COMPLETED` implies every step is terminal (spec §3 invariant).
    pub fn all_steps_terminal(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.successful_runs += 1;
        self.total_runs += 1;
    }

    pub fn mark_failed(&mut self) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.failed_runs += 1;
        self.total_runs += 1;
    }

    pub fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.total_runs += 1;
    }

    /// Effective allow-host list for plugin policy: task-level hosts union
    /// org default, deduplicated. The org default is supplied by the caller
    /// since it is not part of the task aggregate.
    pub fn effective_allowed_hosts(&self, org_default: &[String]) -> Vec<String> {
        let mut hosts = self.constraints.allowed_hosts();
        for h in org_default {
            if !hosts.iter().any(|x| x.eq_ignore_ascii_case(h)) {
                hosts.push(h.clone());
            }
        }
        hosts
    }
}
