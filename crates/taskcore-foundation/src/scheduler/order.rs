//! Diagnostic planned order: a `petgraph` topological sort over a task's
//! steps, used to annotate `task.planned` events with a human-readable
//! execution order. The scheduler's actual readiness computation lives in
//! `taskcore_kernel::domain::dag` — this is reporting, not control flow.

use petgraph::graph::DiGraph;
use petgraph::algo::toposort;
use std::collections::HashMap;

use taskcore_kernel::domain::Step;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};

pub fn planned_order(steps: &[Step]) -> TaskCoreResult<Vec<String>> {
    let mut graph = DiGraph::<String, ()>::new();
    let mut indices = HashMap::new();

    for step in steps {
        let idx = graph.add_node(step.id.clone());
        indices.insert(step.id.clone(), idx);
    }
    for step in steps {
        let Some(&to) = indices.get(&step.id) else { continue };
        for dep in &step.depends_on {
            if let Some(&from) = indices.get(dep) {
                graph.add_edge(from, to, ());
            }
        }
    }

    toposort(&graph, None)
        .map(|order| order.into_iter().map(|idx| graph[idx].clone()).collect())
        .map_err(|_| TaskCoreError::invalid_input("step graph contains a cycle"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcore_kernel::domain::StepKind;

    #[test]
    fn orders_dependents_after_their_dependencies() {
        let steps = vec![
            Step::new("b", "b", StepKind::Plugin).depends_on(["a"]),
            Step::new("a", "a", StepKind::Plugin),
        ];
        let order = planned_order(&steps).unwrap();
        assert!(order.iter().position(|s| s == "a") < order.iter().position(|s| s == "b"));
    }

    #[test]
    fn rejects_a_cycle() {
        let steps = vec![
            Step::new("a", "a", StepKind::Plugin).depends_on(["b"]),
            Step::new("b", "b", StepKind::Plugin).depends_on(["a"]),
        ];
        assert!(planned_order(&steps).is_err());
    }
}
