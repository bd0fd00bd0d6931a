//! Checkpoint: a suspension record pausing a step awaiting a human decision.
//!
//! Field shape grounded on the original Python domain model
//! (`apps/tentackl/src/domain/checkpoints/models.py`): a checkpoint response
//! is typed by checkpoint type, hence the separate `response_*` fields
//! rather than one untyped payload.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::CheckpointType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointDecision {
    Pending,
    Approved,
    Rejected,
    AutoApproved,
    Expired,
}

impl CheckpointDecision {
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointResponse {
    pub feedback: Option<String>,
    pub inputs: Option<HashMap<String, serde_json::Value>>,
    pub modified_inputs: Option<HashMap<String, serde_json::Value>>,
    pub selected_alternative: Option<serde_json::Value>,
    pub answers: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub learn: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub task_id: String,
    pub step_id: String,
    pub checkpoint_type: CheckpointType,
    pub prompt: String,
    #[serde(default)]
    pub preview_data: HashMap<String, serde_json::Value>,
    pub input_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub alternatives: Vec<serde_json::Value>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub decision: CheckpointDecision,
    pub decided_at: Option<DateTime<Utc>>,
    pub response: Option<CheckpointResponse>,

    /// Audit trail for auto-decided / user-decided checkpoints.
    pub decided_by: Option<String>,
    pub preference_used: Option<String>,
}

impl Checkpoint {
    pub fn new(
        task_id: impl Into<String>,
        step_id: impl Into<String>,
        checkpoint_type: CheckpointType,
        prompt: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            step_id: step_id.into(),
            checkpoint_type,
            prompt: prompt.into(),
            preview_data: HashMap::new(),
            input_schema: None,
            alternatives: Vec::new(),
            expires_at,
            created_at: Utc::now(),
            decision: CheckpointDecision::Pending,
            decided_at: None,
            response: None,
            decided_by: None,
            preference_used: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.decision, CheckpointDecision::Pending)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now >= self.expires_at
    }

    pub fn resolve(&mut self, decision: CheckpointDecision, response: Option<CheckpointResponse>, decided_by: Option<String>) {
        self.decision = decision;
        self.decided_at = Some(Utc::now());
        self.response = response;
        self.decided_by = decided_by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_checkpoint_expires_after_deadline() {
        let cp = Checkpoint::new(
            "t1",
            "s1",
            CheckpointType::Approval,
            "approve?",
            Utc::now() - chrono::Duration::seconds(1),
        );
        assert!(cp.is_expired(Utc::now()));
    }

    #[test]
    fn resolve_transitions_out_of_pending() {
        let mut cp = Checkpoint::new("t1", "s1", CheckpointType::Approval, "approve?", Utc::now() + chrono::Duration::hours(1));
        assert!(cp.is_pending());
        cp.resolve(CheckpointDecision::Approved, None, Some("u1".into()));
        assert!(!cp.is_pending());
        assert_eq!(cp.decision, CheckpointDecision::Approved);
    }

}
