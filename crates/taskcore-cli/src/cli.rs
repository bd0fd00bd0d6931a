//! Argument parsing, grounded on the teacher's clap-derive CLI convention.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "taskcore", version, about = "Run and inspect task orchestration core tasks from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit machine-readable JSON instead of a table.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a task for `goal`, plan it, and drive it to completion,
    /// resolving any checkpoints it raises along the way.
    Run {
        /// The goal to hand to the planner.
        #[arg(long)]
        goal: String,

        /// Inline JSON object of constraints, e.g. '{"allowed_hosts": ["example.com"]}'.
        #[arg(long)]
        constraints: Option<String>,

        /// Resolve every checkpoint as approved without prompting.
        #[arg(long)]
        auto_approve: bool,

        /// LLM chat-completions endpoint for the planner (falls back to
        /// `PLANNER_MODEL`-only static planning when unset, for local runs
        /// against the built-in plugins without a live model).
        #[arg(long, env = "PLANNER_ENDPOINT")]
        planner_endpoint: Option<String>,

        #[arg(long, env = "PLANNER_MODEL")]
        planner_model: Option<String>,

        #[arg(long, env = "PLANNER_API_KEY")]
        planner_api_key: Option<String>,
    },

    /// List the built-in plugin catalogue (namespace, category, schemas).
    Plugins,
}
