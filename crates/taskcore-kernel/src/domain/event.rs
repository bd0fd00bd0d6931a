//! Event: a structured record published on the event bus and bridged to SSE.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceType {
    Orchestrator,
    Scheduler,
    Dispatcher,
    Planner,
    CheckpointManager,
    PluginExecutor,
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub source: String,
    pub source_type: EventSourceType,
    /// Dotted event type, e.g. `task.step.completed`.
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
    pub task_id: Option<String>,
    pub agent_id: Option<String>,
}

impl Event {
    pub fn new(source: impl Into<String>, source_type: EventSourceType, event_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            source_type,
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload: HashMap::new(),
            task_id: None,
            agent_id: None,
        }
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// Well-known dotted event type constants, so callers don't retype strings.
pub mod event_types {
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_PLANNED: &str = "task.planned";
    pub const TASK_STARTED: &str = "task.started";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_FAILED: &str = "task.failed";
    pub const TASK_CANCELLED: &str = "task.cancelled";
    pub const TASK_REPLANNING: &str = "task.replanning";

    pub const STEP_STARTED: &str = "task.step.started";
    pub const STEP_COMPLETED: &str = "task.step.completed";
    pub const STEP_FAILED: &str = "task.step.failed";
    pub const STEP_RETRY: &str = "task.step.retry";

    pub const CHECKPOINT_CREATED: &str = "task.checkpoint.created";
    pub const CHECKPOINT_RESOLVED: &str = "task.checkpoint.resolved";
}

/// The string a subscription pattern is actually matched against: `event_type`
/// constants never embed a task id (`task.step.completed`, not
/// `task.<id>.step.completed`), so per-task scoping splices `task_id` in
/// right after the leading `task.` segment. An event with no `task_id` is
/// matched on its bare `event_type`.
pub fn routing_key(event: &Event) -> String {
    match &event.task_id {
        Some(id) => match event.event_type.strip_prefix("task.") {
            Some(rest) if !rest.is_empty() => format!("task.{id}.{rest}"),
            _ => format!("task.{id}"),
        },
        None => event.event_type.clone(),
    }
}

/// Dotted-pattern matcher: `*` matches exactly one segment, `**` matches any
/// suffix of segments (including zero). Grounded in the SSE subscription
/// pattern `task.<task_id>.**` described in spec §4.2/§6. Callers matching a
/// live `Event` should match against `routing_key`, not `event_type`
/// directly, so the task id becomes part of the matched path.
pub fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    let pattern_segs: Vec<&str> = pattern.split('.').collect();
    let event_segs: Vec<&str> = event_type.split('.').collect();
    matches_segments(&pattern_segs, &event_segs)
}

fn matches_segments(pattern: &[&str], event: &[&str]) -> bool {
    match pattern.first() {
        None => event.is_empty(),
        Some(&"**") => {
            if pattern.len() == 1 {
                return true;
            }
            for i in 0..=event.len() {
                if matches_segments(&pattern[1..], &event[i..]) {
                    return true;
                }
            }
            false
        }
        Some(&"*") => !event.is_empty() && matches_segments(&pattern[1..], &event[1..]),
        Some(seg) => event.first() == Some(seg) && matches_segments(&pattern[1..], &event[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(pattern_matches("task.step.completed", "task.step.completed"));
        assert!(!pattern_matches("task.step.completed", "task.step.failed"));
    }

    #[test]
    fn single_wildcard_matches_one_segment() {
        assert!(pattern_matches("task.*.completed", "task.step.completed"));
        assert!(!pattern_matches("task.*.completed", "task.step.sub.completed"));
    }

    #[test]
    fn double_wildcard_matches_any_suffix() {
        assert!(pattern_matches("task.abc123.**", "task.abc123.step.completed"));
        assert!(pattern_matches("task.abc123.**", "task.abc123.checkpoint.created"));
        assert!(pattern_matches("task.abc123.**", "task.abc123"));
        assert!(!pattern_matches("task.abc123.**", "task.other.step.completed"));
    }

    #[test]
    fn sse_bridge_pattern_scoped_to_one_task() {
        let pattern = format!("task.{}.**", "t-42");
        assert!(pattern_matches(&pattern, "task.t-42.step.completed"));
        assert!(!pattern_matches(&pattern, "task.t-43.step.completed"));
    }

    #[test]
    fn routing_key_splices_the_task_id_after_the_leading_segment() {
        let event = Event::new("sched", EventSourceType::Scheduler, event_types::STEP_COMPLETED).for_task("t-42");
        assert_eq!(routing_key(&event), "task.t-42.step.completed");

        let event = Event::new("orchestrator", EventSourceType::Orchestrator, event_types::TASK_COMPLETED).for_task("t-42");
        assert_eq!(routing_key(&event), "task.t-42.completed");
    }

    #[test]
    fn routing_key_falls_back_to_the_bare_event_type_without_a_task_id() {
        let event = Event::new("api", EventSourceType::Api, "capabilities.refreshed");
        assert_eq!(routing_key(&event), "capabilities.refreshed");
    }

    #[test]
    fn task_scoped_pattern_matches_real_orchestrator_event_types() {
        let pattern = "task.t-42.**";
        let completed = Event::new("orchestrator", EventSourceType::Orchestrator, event_types::TASK_COMPLETED).for_task("t-42");
        assert!(pattern_matches(pattern, &routing_key(&completed)));

        let other_task = Event::new("orchestrator", EventSourceType::Orchestrator, event_types::TASK_COMPLETED).for_task("t-43");
        assert!(!pattern_matches(pattern, &routing_key(&other_task)));
    }
}
