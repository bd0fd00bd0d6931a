//! Sandboxed branch-expression evaluation (invariant B3): `rhai`, scoped to
//! only `task` and `steps`, with no module loading or global-function
//! registration — the whitelist named in spec §4.6 (`len`, `str`, `int`,
//! `abs`, `min`, `max`, comparisons, boolean/list ops) is the entire surface
//! available to the expression.

use rhai::{Engine, Scope};
use taskcore_kernel::domain::Task;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};

fn sandboxed_engine() -> Engine {
    let mut engine = Engine::new();
    // No Engine::register_global_module, no custom functions, no `eval`
    // support beyond rhai's own (which itself has no filesystem/process
    // access) — this engine's default op set already excludes module
    // loading when `no_module` isn't disabled, and we bound total work so a
    // hostile expression can't spin forever.
    engine.set_max_operations(50_000);
    engine.set_max_expr_depths(32, 32);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(1_000);
    engine
}

pub fn evaluate_branch(expression: &str, task: &Task) -> TaskCoreResult<bool> {
    let engine = sandboxed_engine();
    let mut scope = Scope::new();

    let task_json = serde_json::to_value(task)?;
    let task_dynamic = rhai::serde::to_dynamic(&task_json).map_err(|e| TaskCoreError::invalid_input(format!("branch scope: {e}")))?;
    scope.push_constant("task", task_dynamic);

    let steps_json: serde_json::Map<String, serde_json::Value> =
        task.steps.iter().map(|s| (s.id.clone(), serde_json::json!({"status": s.status, "output": s.output}))).collect();
    let steps_dynamic = rhai::serde::to_dynamic(&serde_json::Value::Object(steps_json))
        .map_err(|e| TaskCoreError::invalid_input(format!("branch scope: {e}")))?;
    scope.push_constant("steps", steps_dynamic);

    engine
        .eval_with_scope::<bool>(&mut scope, expression)
        .map_err(|e| TaskCoreError::invalid_input(format!("branch expression error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcore_kernel::domain::{Step, StepKind, TaskOwner};

    fn task() -> Task {
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let mut t = Task::new("t1", owner, "goal");
        let mut step = Step::new("s1", "check", StepKind::Plugin);
        step.output.insert("score".to_string(), serde_json::json!(42));
        t.steps.push(step);
        t
    }

    #[test]
    fn evaluates_a_simple_comparison_against_step_output() {
        let t = task();
        let result = evaluate_branch("steps.s1.output.score > 10", &t).unwrap();
        assert!(result);
    }

    #[test]
    fn dangerous_constructs_are_rejected_by_the_sandbox() {
        let t = task();
        let err = evaluate_branch("import \"std\"; true", &t);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_an_expression_that_does_not_resolve_to_a_boolean() {
        let t = task();
        let err = evaluate_branch("42", &t);
        assert!(err.is_err());
    }
}
