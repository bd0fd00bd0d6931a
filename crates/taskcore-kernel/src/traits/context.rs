//! Explicit task context, threaded scheduler → dispatcher → plugin as the
//! first argument (spec §9: replaces hidden session-scoped mutable context).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Correlation ids and cancellation signal for a single step's execution.
/// Cloning shares the cancellation flag; cloning does not create a new
/// cancellation scope.
#[derive(Clone)]
pub struct TaskContext {
    pub task_id: String,
    pub step_id: String,
    pub attempt: u32,
    cancelled: Arc<AtomicBool>,
}

impl TaskContext {
    pub fn new(task_id: impl Into<String>, step_id: impl Into<String>, attempt: u32) -> Self {
        Self { task_id: task_id.into(), step_id: step_id.into(), attempt, cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_visible_across_clones() {
        let ctx = TaskContext::new("t1", "s1", 1);
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
