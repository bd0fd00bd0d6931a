//! Error taxonomy shared by every component in the orchestration core.

use std::fmt;

/// Convenience alias used throughout the kernel and its implementations.
pub type TaskCoreResult<T> = Result<T, TaskCoreError>;

/// The full set of error kinds a caller (HTTP handler, CLI, or another
/// component) needs to distinguish. Variants map directly onto the HTTP
/// status codes and CLI exit codes described by the orchestration surface.
#[derive(Debug, thiserror::Error)]
pub enum TaskCoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stale version: expected {expected}, found {found}")]
    StaleVersion { expected: u64, found: u64 },

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("timeout after {duration_ms}ms: {context}")]
    Timeout { duration_ms: u64, context: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("plugin failure: {plugin} — {message}")]
    PluginFailure { plugin: String, message: String },

    #[error("planner error: {0}")]
    PlannerError(String),

    #[error("checkpoint expired: {0}")]
    CheckpointExpired(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskCoreError {
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn invalid_input(msg: impl fmt::Display) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    pub fn policy_violation(msg: impl fmt::Display) -> Self {
        Self::PolicyViolation(msg.to_string())
    }

    pub fn stale_version(expected: u64, found: u64) -> Self {
        Self::StaleVersion { expected, found }
    }

    pub fn timeout(duration_ms: u64, context: impl fmt::Display) -> Self {
        Self::Timeout { duration_ms, context: context.to_string() }
    }

    pub fn plugin_failure(plugin: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::PluginFailure { plugin: plugin.to_string(), message: message.to_string() }
    }

    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// A coarse-grained, stable code suitable for an HTTP response body or a
    /// CLI error line — never the `Display` text, which may contain detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidInput(_) => "invalid_input",
            Self::StaleVersion { .. } => "stale_version",
            Self::PolicyViolation(_) => "policy_violation",
            Self::Timeout { .. } => "timeout",
            Self::Network(_) => "network",
            Self::PluginFailure { .. } => "plugin_failure",
            Self::PlannerError(_) => "planner_error",
            Self::CheckpointExpired(_) => "checkpoint_expired",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same operation without changing inputs could
    /// plausibly succeed. Used by the scheduler's retry loop to decide
    /// whether a failure is retryable or terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network(_) | Self::PluginFailure { .. })
    }
}

impl From<serde_json::Error> for TaskCoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidInput(format!("json: {e}"))
    }
}

impl From<std::io::Error> for TaskCoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(format!("io: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_and_does_not_leak_detail() {
        let err = TaskCoreError::not_found("task abc123");
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn stale_version_carries_both_numbers() {
        let err = TaskCoreError::stale_version(3, 5);
        assert_eq!(err.kind(), "stale_version");
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn retryable_classification() {
        assert!(TaskCoreError::timeout(1000, "plugin call").is_retryable());
        assert!(TaskCoreError::Network("connection reset".into()).is_retryable());
        assert!(!TaskCoreError::policy_violation("host not allowed").is_retryable());
        assert!(!TaskCoreError::invalid_input("bad schema").is_retryable());
    }
}
