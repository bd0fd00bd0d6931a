//! UserPreference: a learned auto-approval hint consulted by the checkpoint
//! manager before asking a human.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checkpoint::CheckpointDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceScope {
    Global,
    AgentType,
    TaskType,
    Task,
}

impl PreferenceScope {
    /// Narrowest-first search order used by `try_auto_decide` (spec §4.3:
    /// "narrowest applicable scope").
    pub const SEARCH_ORDER: [PreferenceScope; 4] =
        [PreferenceScope::Task, PreferenceScope::TaskType, PreferenceScope::AgentType, PreferenceScope::Global];
}

/// Only approval/rejection are learnable decisions; auto_approved/expired
/// are outcomes of applying a preference, not inputs to learning one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceDecision {
    Approve,
    Reject,
}

impl TryFrom<CheckpointDecision> for PreferenceDecision {
    type Error = ();

    fn try_from(d: CheckpointDecision) -> Result<Self, Self::Error> {
        match d {
            CheckpointDecision::Approved => Ok(Self::Approve),
            CheckpointDecision::Rejected => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: String,
    pub scope: PreferenceScope,
    pub scope_value: Option<String>,
    pub preference_key: String,
    pub decision: PreferenceDecision,
    pub confidence: f64,
    pub usage_count: u64,
    pub last_used_at: DateTime<Utc>,
}

const LEARNING_ALPHA: f64 = 0.3;
pub const AUTO_APPROVE_THRESHOLD: f64 = 0.85;

impl UserPreference {
    pub fn new(
        user_id: impl Into<String>,
        scope: PreferenceScope,
        scope_value: Option<String>,
        preference_key: impl Into<String>,
        decision: PreferenceDecision,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            scope,
            scope_value,
            preference_key: preference_key.into(),
            decision,
            confidence: if decision == PreferenceDecision::Approve { 1.0 } else { 0.0 },
            usage_count: 1,
            last_used_at: Utc::now(),
        }
    }

    /// Decay-weighted update applied on every new decision for this
    /// preference key (EMA, α=0.3). An `Approve` observation pulls
    /// confidence toward 1.0, a `Reject` observation toward 0.0 —
    /// confidence is always read relative to `self.decision` being
    /// "approve", so a long run of rejections naturally drives confidence
    /// toward 0 and flips `decision` once it crosses the midpoint.
    pub fn observe(&mut self, decision: PreferenceDecision) {
        let observation = if decision == PreferenceDecision::Approve { 1.0 } else { 0.0 };
        let baseline = if self.decision == PreferenceDecision::Approve { self.confidence } else { 1.0 - self.confidence };
        let updated = (LEARNING_ALPHA * observation + (1.0 - LEARNING_ALPHA) * baseline).clamp(0.0, 1.0);

        if updated >= 0.5 {
            self.decision = PreferenceDecision::Approve;
            self.confidence = updated;
        } else {
            self.decision = PreferenceDecision::Reject;
            self.confidence = 1.0 - updated;
        }
        self.usage_count += 1;
        self.last_used_at = Utc::now();
    }

    pub fn meets_auto_approve_threshold(&self) -> bool {
        self.decision == PreferenceDecision::Approve && self.confidence >= AUTO_APPROVE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_approvals_converge_above_threshold() {
        let mut p = UserPreference::new("u1", PreferenceScope::Global, None, "fp1", PreferenceDecision::Approve);
        p.confidence = 0.5;
        for _ in 0..10 {
            p.observe(PreferenceDecision::Approve);
        }
        assert!(p.meets_auto_approve_threshold());
    }

    #[test]
    fn a_rejection_run_flips_decision_and_blocks_auto_approve() {
        let mut p = UserPreference::new("u1", PreferenceScope::Global, None, "fp1", PreferenceDecision::Approve);
        for _ in 0..10 {
            p.observe(PreferenceDecision::Reject);
        }
        assert_eq!(p.decision, PreferenceDecision::Reject);
        assert!(!p.meets_auto_approve_threshold());
    }

    #[test]
    fn search_order_is_narrowest_first() {
        assert_eq!(PreferenceScope::SEARCH_ORDER[0], PreferenceScope::Task);
        assert_eq!(PreferenceScope::SEARCH_ORDER[3], PreferenceScope::Global);
    }
}
