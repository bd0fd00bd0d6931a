//! Findings: append-only structured observations added to a task's shared
//! memory by a step.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Fact,
    Artifact,
    Warning,
    Suggestion,
    /// Not a literal kind in spec's enum list, but findings of this shape
    /// (`kind: fact`, with `data.reason`) are how a step signals the
    /// replanning trigger described in §4.5 — kept as its own variant so
    /// the orchestrator can recognize the trigger without string-matching
    /// `content`.
    ReplanRequested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub source_step_id: String,
    pub kind: FindingKind,
    pub content: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Finding {
    pub fn new(source_step_id: impl Into<String>, kind: FindingKind, content: impl Into<String>) -> Self {
        Self {
            source_step_id: source_step_id.into(),
            kind,
            content: content.into(),
            data: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn replan_requested(source_step_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut f = Self::new(source_step_id, FindingKind::ReplanRequested, reason.clone());
        f.data.insert("reason".to_string(), serde_json::Value::String(reason));
        f
    }

    pub fn is_replan_request(&self) -> bool {
        matches!(self.kind, FindingKind::ReplanRequested)
    }
}
