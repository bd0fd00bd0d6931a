//! DAG validation and topological ordering over a step list.
//!
//! These are pure functions over `&[Step]` so they apply equally to a whole
//! task's step list and to a planner-produced subgraph before it is spliced
//! in.

use std::collections::{HashMap, HashSet};

use crate::error::TaskCoreError;

use super::step::Step;

/// Every referenced step id exists, there are no duplicate ids, and no
/// cycle is present. Mirrors spec §4.5's planner-validation requirement.
pub fn validate(steps: &[Step]) -> Result<(), TaskCoreError> {
    let ids: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
    if ids.len() != steps.len() {
        return Err(TaskCoreError::invalid_input("duplicate step ids in plan"));
    }
    for step in steps {
        for dep in &step.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(TaskCoreError::invalid_input(format!(
                    "step '{}' depends on non-existent step '{}'",
                    step.id, dep
                )));
            }
        }
    }
    topological_order(steps)?;
    Ok(())
}

/// Kahn's algorithm with deterministic tie-breaking (lexicographic by step
/// id) so the same plan always yields the same order — useful for tests and
/// for the scheduler's fairness rule (§4.7: ties broken by priority then id).
pub fn topological_order(steps: &[Step]) -> Result<Vec<String>, TaskCoreError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for step in steps {
        in_degree.entry(step.id.as_str()).or_insert(0);
        for dep in &step.depends_on {
            *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(step.id.as_str());
        }
    }

    let mut ready: Vec<&str> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(&id, _)| id).collect();
    ready.sort_unstable();

    let mut order = Vec::with_capacity(steps.len());
    while let Some(pos) = ready.first().copied() {
        ready.remove(0);
        order.push(pos.to_string());
        if let Some(deps) = dependents.get(pos) {
            for &dependent in deps {
                let entry = in_degree.get_mut(dependent).unwrap();
                *entry -= 1;
                if *entry == 0 {
                    let idx = ready.binary_search(&dependent).unwrap_or_else(|e| e);
                    ready.insert(idx, dependent);
                }
            }
        }
    }

    if order.len() != steps.len() {
        return Err(TaskCoreError::invalid_input("step dependency graph contains a cycle"));
    }
    Ok(order)
}

/// Steps that are `Pending` and whose dependencies are all in `succeeded`.
/// This is the planner-validation / replan-splice notion of "ready"; the
/// scheduler's richer notion (concurrency caps, checkpoint gates) lives in
/// `taskcore-foundation`.
pub fn ready_steps(steps: &[Step], succeeded: &HashSet<String>) -> Vec<String> {
    steps
        .iter()
        .filter(|s| s.status == super::step::StepStatus::Pending && s.dependencies_met(succeeded))
        .map(|s| s.id.clone())
        .collect()
}
