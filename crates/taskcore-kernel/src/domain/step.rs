//! The Step node: a unit of a task's plan.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `Step::status` — see spec §4.8 step substates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
    WaitingApproval,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped | Self::Cancelled)
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded | Self::Skipped)
    }
}

/// What a step does when dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Plugin,
    LlmAgent,
    Checkpoint,
    Branch,
}

/// What happens to a dependent step when one of its dependencies fails or
/// is skipped. Default is to block (mark the dependent `Skipped` in spec
/// terms the step goes `Failed`'s dependent -> `BLOCKED`, modeled here as
/// the step staying non-ready and eventually Skipped by the scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDepFailure {
    Block,
    Skip,
}

impl Default for OnDepFailure {
    fn default() -> Self {
        Self::Block
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1
}
fn default_multiplier() -> f64 {
    2.0
}
fn default_max_delay() -> u64 {
    60
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_seconds: default_initial_delay(),
            multiplier: default_multiplier(),
            max_delay_seconds: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay, in seconds, before the given 1-based attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let raw = self.initial_delay_seconds as f64 * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        (raw.round() as u64).min(self.max_delay_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointType {
    Approval,
    Input,
    Modify,
    Select,
    Qa,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointDescriptor {
    pub checkpoint_type: Option<CheckpointType>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub preview_data: HashMap<String, serde_json::Value>,
    pub input_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub alternatives: Vec<serde_json::Value>,
}

/// An error recorded on a failed step: the taxonomy kind plus a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepError {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    pub kind: StepKind,

    /// Plugin namespace when `kind == Plugin`.
    #[serde(default)]
    pub plugin_namespace: Option<String>,
    /// Agent spec (model/system-prompt reference) when `kind == LlmAgent`.
    #[serde(default)]
    pub agent_spec: Option<String>,
    /// Whitelisted expression text when `kind == Branch`.
    #[serde(default)]
    pub branch_expression: Option<String>,

    /// Input mapping; values are literals or `{{steps.X.path}}` /
    /// `{{task.field}}` references, resolved by the dispatcher.
    #[serde(default)]
    pub inputs: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub on_dep_failure: OnDepFailure,
    #[serde(default)]
    pub concurrency_group: Option<String>,
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub retry_policy: RetryPolicy,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub output: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub error: Option<StepError>,

    #[serde(default)]
    pub checkpoint: Option<CheckpointDescriptor>,
}

fn default_timeout_seconds() -> u64 {
    300
}

impl Step {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            plugin_namespace: None,
            agent_spec: None,
            branch_expression: None,
            inputs: HashMap::new(),
            depends_on: Vec::new(),
            on_dep_failure: OnDepFailure::Block,
            concurrency_group: None,
            priority: 0,
            retry_policy: RetryPolicy::default(),
            timeout_seconds: default_timeout_seconds(),
            status: StepStatus::Pending,
            attempts: 0,
            started_at: None,
            completed_at: None,
            output: HashMap::new(),
            error: None,
            checkpoint: None,
        }
    }

    pub fn plugin(id: impl Into<String>, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let mut s = Self::new(id, name, StepKind::Plugin);
        s.plugin_namespace = Some(namespace.into());
        s
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    pub fn dependencies_met(&self, succeeded: &std::collections::HashSet<String>) -> bool {
        self.depends_on.iter().all(|d| succeeded.contains(d))
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.retry_policy.max_attempts
    }

    pub fn mark_running(&mut self) {
        self.status = StepStatus::Running;
        self.attempts += 1;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_succeeded(&mut self, output: HashMap<String, serde_json::Value>) {
        self.status = StepStatus::Succeeded;
        self.output = output;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(StepError { kind: kind.into(), message: message.into() });
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        let s = Step::new("s1", "fetch", StepKind::Plugin);
        assert_eq!(s.status, StepStatus::Pending);
        assert!(!s.status.is_terminal());
    }

    #[test]
    fn dependencies_met_checks_all() {
        let s = Step::new("s2", "x", StepKind::Plugin).depends_on(["s1", "s0"]);
        let mut succeeded = std::collections::HashSet::new();
        succeeded.insert("s1".to_string());
        assert!(!s.dependencies_met(&succeeded));
        succeeded.insert("s0".to_string());
        assert!(s.dependencies_met(&succeeded));
    }

    #[test]
    fn retry_backoff_caps_at_max_delay() {
        let policy = RetryPolicy { max_attempts: 5, initial_delay_seconds: 1, multiplier: 2.0, max_delay_seconds: 4 };
        assert_eq!(policy.delay_for_attempt(1), 1);
        assert_eq!(policy.delay_for_attempt(2), 2);
        assert_eq!(policy.delay_for_attempt(3), 4);
        assert_eq!(policy.delay_for_attempt(4), 4);
    }

    #[test]
    fn can_retry_respects_max_attempts() {
        let mut s = Step::new("s1", "x", StepKind::Plugin);
        s.retry_policy.max_attempts = 2;
        assert!(s.can_retry());
        s.attempts = 2;
        assert!(!s.can_retry());
    }
}
