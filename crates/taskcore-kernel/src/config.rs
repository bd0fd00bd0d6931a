//! Environment-driven configuration (spec §6), opt-in via the `config`
//! feature — mirrors the teacher's `config` feature convention.

use serde::Deserialize;

fn default_worker_pool_size() -> usize {
    num_cpus_fallback() * 2
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2)
}

fn default_task_default_concurrency() -> usize {
    4
}

fn default_step_default_timeout_seconds() -> u64 {
    300
}

fn default_planner_max_validation_retries() -> u32 {
    2
}

fn default_checkpoint_default_expiry_seconds() -> i64 {
    86_400
}

fn default_event_replay_log_size() -> usize {
    10_000
}

fn default_cache_ttl_seconds() -> u64 {
    600
}

fn default_lease_ttl_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_task_default_concurrency")]
    pub task_default_concurrency: usize,
    #[serde(default = "default_step_default_timeout_seconds")]
    pub step_default_timeout_seconds: u64,
    #[serde(default)]
    pub planner_model: Option<String>,
    #[serde(default = "default_planner_max_validation_retries")]
    pub planner_max_validation_retries: u32,
    #[serde(default = "default_checkpoint_default_expiry_seconds")]
    pub checkpoint_default_expiry_seconds: i64,
    #[serde(default)]
    pub allowed_hosts_default: String,
    #[serde(default = "default_event_replay_log_size")]
    pub event_replay_log_size: usize,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_lease_ttl_seconds")]
    pub lease_ttl_seconds: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            task_default_concurrency: default_task_default_concurrency(),
            step_default_timeout_seconds: default_step_default_timeout_seconds(),
            planner_model: None,
            planner_max_validation_retries: default_planner_max_validation_retries(),
            checkpoint_default_expiry_seconds: default_checkpoint_default_expiry_seconds(),
            allowed_hosts_default: String::new(),
            event_replay_log_size: default_event_replay_log_size(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            lease_ttl_seconds: default_lease_ttl_seconds(),
        }
    }
}

impl CoreConfig {
    /// Load from environment, falling back to the defaults in spec §6 for
    /// anything unset. Variable names match spec §6 exactly
    /// (`WORKER_POOL_SIZE`, `TASK_DEFAULT_CONCURRENCY`, ...).
    pub fn from_env() -> crate::error::TaskCoreResult<Self> {
        Self::build().map_err(|e| crate::error::TaskCoreError::internal(format!("config: {e}")))
    }

    fn build() -> Result<Self, config::ConfigError> {
        let source = config::Config::builder()
            .set_default("worker_pool_size", default_worker_pool_size() as i64)?
            .set_default("task_default_concurrency", default_task_default_concurrency() as i64)?
            .set_default("step_default_timeout_seconds", default_step_default_timeout_seconds() as i64)?
            .set_default("planner_max_validation_retries", default_planner_max_validation_retries() as i64)?
            .set_default("checkpoint_default_expiry_seconds", default_checkpoint_default_expiry_seconds())?
            .set_default("allowed_hosts_default", "")?
            .set_default("event_replay_log_size", default_event_replay_log_size() as i64)?
            .set_default("cache_ttl_seconds", default_cache_ttl_seconds() as i64)?
            .set_default("lease_ttl_seconds", default_lease_ttl_seconds() as i64)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        source.try_deserialize()
    }

    pub fn allowed_hosts(&self) -> Vec<String> {
        self.allowed_hosts_default
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = CoreConfig::default();
        assert_eq!(c.task_default_concurrency, 4);
        assert_eq!(c.step_default_timeout_seconds, 300);
        assert_eq!(c.checkpoint_default_expiry_seconds, 86_400);
        assert_eq!(c.event_replay_log_size, 10_000);
        assert_eq!(c.cache_ttl_seconds, 600);
        assert_eq!(c.lease_ttl_seconds, 60);
    }

    #[test]
    fn allowed_hosts_splits_and_trims_csv() {
        let mut c = CoreConfig::default();
        c.allowed_hosts_default = "example.com, api.example.com ,".to_string();
        assert_eq!(c.allowed_hosts(), vec!["example.com".to_string(), "api.example.com".to_string()]);
    }
}
