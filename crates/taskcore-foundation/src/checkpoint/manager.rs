//! C3 — Checkpoint Manager implementation, grounded on the original Python
//! `checkpoints/models.py` shape for `CheckpointDecision`/`CheckpointType`/
//! `CheckpointResponse`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use taskcore_kernel::domain::step::CheckpointDescriptor;
use taskcore_kernel::domain::{Checkpoint, CheckpointDecision, CheckpointResponse, PreferenceDecision, PreferenceScope};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{CheckpointManager, TaskStore};

use super::fingerprint::fingerprint;
use super::preferences::PreferenceStore;

fn pending_key(task_id: &str, step_id: &str) -> String {
    format!("{task_id}::{step_id}")
}

pub struct InMemoryCheckpointManager {
    store: Arc<dyn TaskStore>,
    pending: RwLock<HashMap<String, Checkpoint>>,
    preferences: PreferenceStore,
    default_expiry: chrono::Duration,
}

impl InMemoryCheckpointManager {
    pub fn new(store: Arc<dyn TaskStore>, default_expiry_seconds: i64) -> Self {
        Self {
            store,
            pending: RwLock::new(HashMap::new()),
            preferences: PreferenceStore::new(),
            default_expiry: chrono::Duration::seconds(default_expiry_seconds),
        }
    }

    async fn scoped_lookups(
        &self,
        task_id: &str,
        step_id: &str,
    ) -> TaskCoreResult<Vec<(PreferenceScope, Option<String>)>> {
        let task = self.store.get_task(&task_id.to_string()).await?;
        let task_type = task.metadata.get("task_type").and_then(|v| v.as_str()).map(str::to_string);
        let agent_type = task.get_step(step_id).and_then(|s| s.agent_spec.clone());

        let mut lookups = vec![(PreferenceScope::Task, Some(task_id.to_string()))];
        if let Some(tt) = task_type {
            lookups.push((PreferenceScope::TaskType, Some(tt)));
        }
        if let Some(at) = agent_type {
            lookups.push((PreferenceScope::AgentType, Some(at)));
        }
        lookups.push((PreferenceScope::Global, None));
        Ok(lookups)
    }

    fn descriptor_fingerprint(&self, step_name: &str, descriptor: &CheckpointDescriptor) -> String {
        let checkpoint_type = descriptor.checkpoint_type.unwrap_or(taskcore_kernel::domain::step::CheckpointType::Approval);
        fingerprint(step_name, &descriptor.preview_data, checkpoint_type)
    }
}

#[async_trait]
impl CheckpointManager for InMemoryCheckpointManager {
    async fn create_checkpoint(
        &self,
        task_id: &str,
        step_id: &str,
        descriptor: &CheckpointDescriptor,
    ) -> TaskCoreResult<Checkpoint> {
        let checkpoint_type = descriptor
            .checkpoint_type
            .ok_or_else(|| TaskCoreError::invalid_input("checkpoint descriptor missing checkpoint_type"))?;
        let mut checkpoint = Checkpoint::new(
            task_id,
            step_id,
            checkpoint_type,
            descriptor.prompt.clone().unwrap_or_default(),
            Utc::now() + self.default_expiry,
        );
        checkpoint.preview_data = descriptor.preview_data.clone();
        checkpoint.input_schema = descriptor.input_schema.clone();
        checkpoint.alternatives = descriptor.alternatives.clone();

        self.pending.write().insert(pending_key(task_id, step_id), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn resolve_checkpoint(
        &self,
        task_id: &str,
        step_id: &str,
        decision: CheckpointDecision,
        response: Option<CheckpointResponse>,
        decided_by: Option<String>,
    ) -> TaskCoreResult<Checkpoint> {
        let key = pending_key(task_id, step_id);
        let mut pending = self.pending.write();
        let checkpoint = pending.get_mut(&key).ok_or_else(|| TaskCoreError::not_found(format!("checkpoint {key}")))?;
        if !checkpoint.is_pending() {
            return Err(TaskCoreError::invalid_input(format!("checkpoint {key} is already decided")));
        }

        let learn = response.as_ref().map(|r| r.learn).unwrap_or(false);
        checkpoint.resolve(decision, response, decided_by.clone());
        let resolved = checkpoint.clone();
        drop(pending);

        if learn {
            if let Ok(pref_decision) = PreferenceDecision::try_from(decision) {
                if let Some(user_id) = decided_by {
                    let task = self.store.get_task(&task_id.to_string()).await?;
                    let step_name = task.get_step(step_id).map(|s| s.name.clone()).unwrap_or_default();
                    let descriptor = CheckpointDescriptor {
                        checkpoint_type: Some(resolved.checkpoint_type),
                        preview_data: resolved.preview_data.clone(),
                        ..Default::default()
                    };
                    let fp = self.descriptor_fingerprint(&step_name, &descriptor);
                    self.preferences.observe(&user_id, PreferenceScope::Task, Some(task_id), &fp, pref_decision);
                }
            }
        }

        Ok(resolved)
    }

    async fn try_auto_decide(
        &self,
        task_id: &str,
        step_id: &str,
        descriptor: &CheckpointDescriptor,
    ) -> TaskCoreResult<Option<Checkpoint>> {
        let task = self.store.get_task(&task_id.to_string()).await?;
        let step_name = task.get_step(step_id).map(|s| s.name.clone()).unwrap_or_default();
        let fp = self.descriptor_fingerprint(&step_name, descriptor);

        for (scope, scope_value) in self.scoped_lookups(task_id, step_id).await? {
            let Some(pref) =
                self.preferences.lookup(&task.owner.user_id, scope, scope_value.as_deref(), &fp)
            else {
                continue;
            };
            if pref.meets_auto_approve_threshold() {
                let mut checkpoint = self.create_checkpoint(task_id, step_id, descriptor).await?;
                checkpoint.resolve(CheckpointDecision::AutoApproved, None, None);
                checkpoint.preference_used = Some(fp);
                self.pending.write().insert(pending_key(task_id, step_id), checkpoint.clone());
                return Ok(Some(checkpoint));
            }
        }
        Ok(None)
    }

    async fn get_pending(&self, task_id: &str) -> TaskCoreResult<Vec<Checkpoint>> {
        Ok(self
            .pending
            .read()
            .values()
            .filter(|c| c.task_id == task_id && c.is_pending())
            .cloned()
            .collect())
    }

    async fn get_resolution(&self, task_id: &str, step_id: &str) -> TaskCoreResult<Option<Checkpoint>> {
        Ok(self.pending.read().get(&pending_key(task_id, step_id)).cloned())
    }

    async fn expire_overdue(&self) -> TaskCoreResult<Vec<Checkpoint>> {
        let now = Utc::now();
        let mut expired = Vec::new();
        let mut pending = self.pending.write();
        for checkpoint in pending.values_mut() {
            if checkpoint.is_expired(now) {
                checkpoint.resolve(CheckpointDecision::Expired, None, None);
                expired.push(checkpoint.clone());
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use std::time::Duration;
    use taskcore_kernel::domain::{Task, TaskOwner};

    async fn store_with_task() -> Arc<dyn TaskStore> {
        let store = Arc::new(InMemoryTaskStore::new(Duration::from_secs(600)));
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        store.create_task(Task::new("t1", owner, "goal")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_then_resolve_marks_decided() {
        let store = store_with_task().await;
        let mgr = InMemoryCheckpointManager::new(store, 86_400);
        let descriptor = CheckpointDescriptor {
            checkpoint_type: Some(taskcore_kernel::domain::step::CheckpointType::Approval),
            prompt: Some("send it?".into()),
            ..Default::default()
        };
        mgr.create_checkpoint("t1", "s1", &descriptor).await.unwrap();
        let resolved = mgr
            .resolve_checkpoint("t1", "s1", CheckpointDecision::Approved, None, Some("u1".into()))
            .await
            .unwrap();
        assert_eq!(resolved.decision, CheckpointDecision::Approved);
    }

    #[tokio::test]
    async fn learned_preference_eventually_auto_approves() {
        let store = store_with_task().await;
        let mgr = InMemoryCheckpointManager::new(store, 86_400);
        let descriptor = CheckpointDescriptor {
            checkpoint_type: Some(taskcore_kernel::domain::step::CheckpointType::Approval),
            prompt: Some("send it?".into()),
            ..Default::default()
        };

        for _ in 0..10 {
            mgr.create_checkpoint("t1", "s1", &descriptor).await.unwrap();
            mgr.resolve_checkpoint(
                "t1",
                "s1",
                CheckpointDecision::Approved,
                Some(CheckpointResponse { learn: true, ..Default::default() }),
                Some("u1".into()),
            )
            .await
            .unwrap();
        }

        let decided = mgr.try_auto_decide("t1", "s1", &descriptor).await.unwrap();
        assert!(decided.is_some());
        assert_eq!(decided.unwrap().decision, CheckpointDecision::AutoApproved);
    }

    #[tokio::test]
    async fn get_resolution_reflects_the_decision_after_resolve() {
        let store = store_with_task().await;
        let mgr = InMemoryCheckpointManager::new(store, 86_400);
        assert!(mgr.get_resolution("t1", "s1").await.unwrap().is_none());

        let descriptor = CheckpointDescriptor {
            checkpoint_type: Some(taskcore_kernel::domain::step::CheckpointType::Approval),
            ..Default::default()
        };
        mgr.create_checkpoint("t1", "s1", &descriptor).await.unwrap();
        assert_eq!(mgr.get_resolution("t1", "s1").await.unwrap().unwrap().decision, CheckpointDecision::Pending);

        mgr.resolve_checkpoint("t1", "s1", CheckpointDecision::Approved, None, Some("u1".into())).await.unwrap();
        assert_eq!(mgr.get_resolution("t1", "s1").await.unwrap().unwrap().decision, CheckpointDecision::Approved);
    }

    #[tokio::test]
    async fn expired_checkpoints_are_swept() {
        let store = store_with_task().await;
        let mgr = InMemoryCheckpointManager::new(store, -1);
        let descriptor = CheckpointDescriptor {
            checkpoint_type: Some(taskcore_kernel::domain::step::CheckpointType::Approval),
            ..Default::default()
        };
        mgr.create_checkpoint("t1", "s1", &descriptor).await.unwrap();
        let expired = mgr.expire_overdue().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].decision, CheckpointDecision::Expired);
    }
}
