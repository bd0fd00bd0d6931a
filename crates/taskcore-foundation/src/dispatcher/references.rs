//! Resolves `{{steps.<id>.<path>}}` / `{{task.<field>}}` reference strings in
//! a step's `inputs` map against the current task snapshot.

use std::collections::HashMap;

use regex::Regex;
use taskcore_kernel::domain::Task;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};

fn reference_pattern() -> Regex {
    Regex::new(r"^\{\{\s*([a-zA-Z0-9_.]+)\s*\}\}$").expect("valid reference regex")
}

fn lookup_path<'a>(mut value: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    for segment in path {
        value = value.get(segment)?;
    }
    Some(value)
}

fn resolve_one(reference: &str, task: &Task) -> TaskCoreResult<serde_json::Value> {
    let mut parts = reference.split('.');
    match parts.next() {
        Some("task") => {
            let rest: Vec<&str> = parts.collect();
            let task_json = serde_json::to_value(task)?;
            lookup_path(&task_json, &rest)
                .cloned()
                .ok_or_else(|| TaskCoreError::invalid_input(format!("unresolved reference: task.{}", rest.join("."))))
        }
        Some("steps") => {
            let step_id = parts.next().ok_or_else(|| TaskCoreError::invalid_input("steps reference missing step id"))?;
            let step = task
                .get_step(step_id)
                .ok_or_else(|| TaskCoreError::invalid_input(format!("unresolved reference: unknown step {step_id}")))?;
            let rest: Vec<&str> = parts.collect();
            if rest.is_empty() {
                return Ok(serde_json::to_value(&step.output)?);
            }
            let output_json = serde_json::to_value(&step.output)?;
            lookup_path(&output_json, &rest)
                .cloned()
                .ok_or_else(|| TaskCoreError::invalid_input(format!("unresolved reference: steps.{step_id}.{}", rest.join("."))))
        }
        _ => Err(TaskCoreError::invalid_input(format!("unsupported reference root: {reference}"))),
    }
}

/// Resolves every `"{{...}}"`-shaped string value in `inputs`; non-reference
/// values pass through unchanged, including nested objects/arrays that do
/// not themselves look like a whole-string reference.
pub fn resolve_inputs(
    inputs: &HashMap<String, serde_json::Value>,
    task: &Task,
) -> TaskCoreResult<HashMap<String, serde_json::Value>> {
    let pattern = reference_pattern();
    let mut resolved = HashMap::with_capacity(inputs.len());
    for (key, value) in inputs {
        let resolved_value = match value.as_str() {
            Some(s) => match pattern.captures(s) {
                Some(caps) => resolve_one(&caps[1], task)?,
                None => value.clone(),
            },
            None => value.clone(),
        };
        resolved.insert(key.clone(), resolved_value);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcore_kernel::domain::{StepKind, TaskOwner};
    use taskcore_kernel::domain::Step;

    fn task_with_output() -> Task {
        let owner = TaskOwner { user_id: "u1".into(), organization_id: "org1".into() };
        let mut t = Task::new("t1", owner, "fetch the weather");
        let mut step = Step::new("s1", "fetch", StepKind::Plugin);
        step.output.insert("url".to_string(), serde_json::json!("https://example.com"));
        t.steps.push(step);
        t
    }

    #[test]
    fn resolves_a_step_output_reference() {
        let task = task_with_output();
        let mut inputs = HashMap::new();
        inputs.insert("url".to_string(), serde_json::json!("{{steps.s1.url}}"));
        let resolved = resolve_inputs(&inputs, &task).unwrap();
        assert_eq!(resolved["url"], serde_json::json!("https://example.com"));
    }

    #[test]
    fn resolves_a_task_field_reference() {
        let task = task_with_output();
        let mut inputs = HashMap::new();
        inputs.insert("goal".to_string(), serde_json::json!("{{task.goal}}"));
        let resolved = resolve_inputs(&inputs, &task).unwrap();
        assert_eq!(resolved["goal"], serde_json::json!("fetch the weather"));
    }

    #[test]
    fn literal_values_pass_through_unchanged() {
        let task = task_with_output();
        let mut inputs = HashMap::new();
        inputs.insert("count".to_string(), serde_json::json!(3));
        let resolved = resolve_inputs(&inputs, &task).unwrap();
        assert_eq!(resolved["count"], serde_json::json!(3));
    }
}
