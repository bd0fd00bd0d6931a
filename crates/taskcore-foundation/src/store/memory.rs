//! In-memory dual-backed Task Store: an `RwLock<HashMap>` durable layer plus
//! an independent TTL-expiring cache layer, mirroring the teacher's
//! `InMemoryStore` split between a durable map and a fast-path cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use taskcore_kernel::domain::{Task, TaskId};
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{TaskFilter, TaskPatch, TaskStore};
use tokio::sync::RwLock;

struct CacheEntry {
    task: Task,
    cached_at: Instant,
}

pub struct InMemoryTaskStore {
    durable: RwLock<HashMap<TaskId, Task>>,
    cache: RwLock<HashMap<TaskId, CacheEntry>>,
    cache_ttl: Duration,
}

impl InMemoryTaskStore {
    pub fn new(cache_ttl: Duration) -> Self {
        Self { durable: RwLock::new(HashMap::new()), cache: RwLock::new(HashMap::new()), cache_ttl }
    }

    async fn cache_get(&self, id: &TaskId) -> Option<Task> {
        let cache = self.cache.read().await;
        cache.get(id).and_then(|entry| {
            if entry.cached_at.elapsed() < self.cache_ttl {
                Some(entry.task.clone())
            } else {
                None
            }
        })
    }

    /// Write-through: durable write happens first; a cache-layer failure
    /// never loses the durable write, it just leaves the cache stale until
    /// the next read re-populates it (spec §4.1 "write durable then
    /// invalidate cache on cache failure").
    async fn write_through(&self, task: Task) {
        let mut durable = self.durable.write().await;
        durable.insert(task.id.clone(), task.clone());
        drop(durable);
        let mut cache = self.cache.write().await;
        cache.insert(task.id.clone(), CacheEntry { task, cached_at: Instant::now() });
    }

    async fn invalidate(&self, id: &TaskId) {
        self.cache.write().await.remove(id);
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, task: Task) -> TaskCoreResult<Task> {
        let mut durable = self.durable.write().await;
        if durable.contains_key(&task.id) {
            return Err(TaskCoreError::invalid_input(format!("task {} already exists", task.id)));
        }
        let mut task = task;
        task.version = 1;
        durable.insert(task.id.clone(), task.clone());
        drop(durable);
        self.write_through(task.clone()).await;
        Ok(task)
    }

    async fn get_task(&self, id: &TaskId) -> TaskCoreResult<Task> {
        if let Some(task) = self.cache_get(id).await {
            return Ok(task);
        }
        let durable = self.durable.read().await;
        let task = durable.get(id).cloned().ok_or_else(|| TaskCoreError::not_found(format!("task {id}")))?;
        drop(durable);
        self.write_through(task.clone()).await;
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, expected_version: u64, patch: TaskPatch) -> TaskCoreResult<Task> {
        let mut durable = self.durable.write().await;
        let task = durable.get_mut(id).ok_or_else(|| TaskCoreError::not_found(format!("task {id}")))?;
        if task.version != expected_version {
            return Err(TaskCoreError::stale_version(expected_version, task.version));
        }

        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(steps) = patch.steps {
            task.steps = steps;
        }
        if let Some(findings) = patch.findings {
            task.findings = findings;
        }
        if let Some(idx) = patch.current_step_index {
            task.current_step_index = idx;
        }
        if let Some(metadata) = patch.metadata {
            task.metadata = metadata;
        }
        if let Some(completed_at) = patch.completed_at {
            task.completed_at = completed_at;
        }
        task.version += 1;
        task.updated_at = chrono::Utc::now();
        let updated = task.clone();
        drop(durable);
        self.write_through(updated.clone()).await;
        Ok(updated)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> TaskCoreResult<Vec<Task>> {
        let durable = self.durable.read().await;
        let mut items: Vec<Task> = durable
            .values()
            .filter(|t| filter.organization_id.as_deref().map(|o| t.owner.organization_id == o).unwrap_or(true))
            .filter(|t| filter.user_id.as_deref().map(|u| t.owner.user_id == u).unwrap_or(true))
            .filter(|t| filter.status.map(|s| t.status == s).unwrap_or(true))
            .filter(|t| filter.tree_id.as_deref().map(|tr| t.tree_id == tr).unwrap_or(true))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let offset = filter.offset.unwrap_or(0);
        let items = items.into_iter().skip(offset);
        Ok(match filter.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        })
    }

    async fn delete_task(&self, id: &TaskId) -> TaskCoreResult<()> {
        let mut durable = self.durable.write().await;
        durable.remove(id).ok_or_else(|| TaskCoreError::not_found(format!("task {id}")))?;
        drop(durable);
        self.invalidate(id).await;
        Ok(())
    }

    async fn update_step_status(
        &self,
        id: &TaskId,
        expected_version: u64,
        step_id: &str,
        step: taskcore_kernel::domain::Step,
    ) -> TaskCoreResult<Task> {
        let mut durable = self.durable.write().await;
        let task = durable.get_mut(id).ok_or_else(|| TaskCoreError::not_found(format!("task {id}")))?;
        if task.version != expected_version {
            return Err(TaskCoreError::stale_version(expected_version, task.version));
        }
        let slot = task.get_step_mut(step_id).ok_or_else(|| TaskCoreError::not_found(format!("step {step_id}")))?;
        *slot = step;
        task.version += 1;
        task.updated_at = chrono::Utc::now();
        let updated = task.clone();
        drop(durable);
        self.write_through(updated.clone()).await;
        Ok(updated)
    }
}
