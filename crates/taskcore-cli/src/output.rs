//! Table/JSON rendering, grounded on the teacher's `comfy-table` usage for
//! human-facing CLI summaries.

use comfy_table::{Cell, ContentArrangement, Table};
use taskcore_kernel::domain::{Checkpoint, Step, Task};

fn base_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn task_table(task: &Task) -> Table {
    let mut table = base_table();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec![Cell::new("id"), Cell::new(&task.id)]);
    table.add_row(vec![Cell::new("status"), Cell::new(format!("{:?}", task.status))]);
    table.add_row(vec![Cell::new("goal"), Cell::new(&task.goal)]);
    table.add_row(vec![Cell::new("version"), Cell::new(task.version)]);
    table.add_row(vec![Cell::new("steps"), Cell::new(task.steps.len())]);
    if !task.findings.is_empty() {
        table.add_row(vec![Cell::new("findings"), Cell::new(task.findings.len())]);
    }
    table
}

pub fn steps_table(steps: &[Step]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["id", "name", "kind", "status"]);
    for step in steps {
        table.add_row(vec![
            Cell::new(&step.id),
            Cell::new(&step.name),
            Cell::new(format!("{:?}", step.kind)),
            Cell::new(format!("{:?}", step.status)),
        ]);
    }
    table
}

pub fn pending_checkpoints_table(checkpoints: &[Checkpoint]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["step_id", "type", "prompt", "expires_at"]);
    for cp in checkpoints {
        table.add_row(vec![
            Cell::new(&cp.step_id),
            Cell::new(format!("{:?}", cp.checkpoint_type)),
            Cell::new(&cp.prompt),
            Cell::new(cp.expires_at.to_rfc3339()),
        ]);
    }
    table
}

pub fn plugins_table(plugins: &[taskcore_kernel::traits::PluginSpec]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["namespace", "category", "description", "requires_checkpoint"]);
    for plugin in plugins {
        table.add_row(vec![
            Cell::new(&plugin.namespace),
            Cell::new(&plugin.category),
            Cell::new(&plugin.description),
            Cell::new(plugin.requires_checkpoint),
        ]);
    }
    table
}
