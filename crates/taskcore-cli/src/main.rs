//! Local/dev harness for driving the orchestration core without the HTTP
//! gateway: create a task, plan it, drive it to completion, resolving
//! checkpoints interactively. Grounded on the teacher's clap + tracing-
//! subscriber CLI entry point convention.
//!
//! Exit codes: 0 success, 1 validation/usage, 2 planner failure, 3
//! unrecoverable runtime failure.

mod cli;
mod output;
mod runner;

use clap::Parser;
use taskcore_foundation::with_builtin_plugins;
use taskcore_foundation::plugins::RecordingNotificationProvider;
use taskcore_kernel::error::TaskCoreError;
use taskcore_kernel::traits::PluginRegistry;

use cli::{Cli, Command};

const EXIT_OK: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_PLANNER: i32 = 2;
const EXIT_RUNTIME: i32 = 3;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let code = match dispatch().await {
        Ok(code) => code,
        Err(e) => {
            // Anything reaching here is a failure the business-logic paths
            // below didn't anticipate (e.g. a panic caught elsewhere, or a
            // future fallible setup step) — format it with anyhow's chained
            // `{:#}` rather than inventing a new exit-code category for it.
            eprintln!("error: {e:#}");
            EXIT_RUNTIME
        }
    };

    std::process::exit(code);
}

async fn dispatch() -> anyhow::Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{e}");
            return Ok(EXIT_USAGE);
        }
    };

    Ok(match cli.command {
        Command::Run { goal, constraints, auto_approve, planner_endpoint, planner_model, planner_api_key } => {
            run_command(cli.json, goal, constraints, auto_approve, planner_endpoint, planner_model, planner_api_key).await
        }
        Command::Plugins => plugins_command(cli.json),
    })
}

async fn run_command(
    json: bool,
    goal: String,
    constraints: Option<String>,
    auto_approve: bool,
    planner_endpoint: Option<String>,
    planner_model: Option<String>,
    planner_api_key: Option<String>,
) -> i32 {
    if goal.trim().is_empty() {
        eprintln!("error: --goal must not be empty");
        return EXIT_USAGE;
    }

    let constraints = match runner::parse_constraints(constraints.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_USAGE;
        }
    };

    let options = runner::RunOptions { goal, constraints, auto_approve, planner_endpoint, planner_model, planner_api_key };

    match runner::run_to_completion(options).await {
        Ok(task) => {
            print_task(&task, json);
            match task.status {
                taskcore_kernel::domain::TaskStatus::Completed => EXIT_OK,
                _ => EXIT_RUNTIME,
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            match e {
                TaskCoreError::PlannerError(_) => EXIT_PLANNER,
                TaskCoreError::InvalidInput(_) => EXIT_USAGE,
                _ => EXIT_RUNTIME,
            }
        }
    }
}

fn print_task(task: &taskcore_kernel::domain::Task, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(task).unwrap_or_default());
    } else {
        println!("{}", output::task_table(task));
        if !task.steps.is_empty() {
            println!("{}", output::steps_table(&task.steps));
        }
    }
}

fn plugins_command(json: bool) -> i32 {
    let registry = with_builtin_plugins(std::sync::Arc::new(RecordingNotificationProvider::new()));
    let plugins = registry.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&plugins).unwrap_or_default());
    } else {
        println!("{}", output::plugins_table(&plugins));
    }
    EXIT_OK
}
