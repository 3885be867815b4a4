//! Execute a workflow directory against the local docker daemon
//!
//! Run with: cargo run --example run_workflow -- <workflow-dir> <event>

use std::path::{Path, PathBuf};

use local_actions::engine::CancellationToken;
use local_actions::{Plan, PlanExecutor, RunnerConfig, WorkflowLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("local_actions=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| ".github/workflows".to_string());
    let event = args.next().unwrap_or_else(|| "push".to_string());

    let config = RunnerConfig {
        workdir: PathBuf::from("."),
        event_name: event.clone(),
        platforms: [(
            "ubuntu-latest".to_string(),
            "node:16-buster-slim".to_string(),
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    };

    let workflows = WorkflowLoader::load_directory(Path::new(&dir))?;
    let payload = config.load_event_payload()?;
    let plan = Plan::build(&workflows, &event, payload.as_ref())?;
    println!(
        "Planned {} stage(s), {} run(s) for '{}'",
        plan.stages.len(),
        plan.run_count(),
        event
    );

    let executor = PlanExecutor::new(config)?;
    let cancel = CancellationToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let result = executor.execute(&plan, cancel).await?;

    println!("\n=== Plan Results ===");
    println!("Plan ID: {}", result.plan_id);
    println!("Success: {}", result.success);
    if let Some(error) = &result.first_error {
        println!("First error: {}", error);
    }
    println!();

    for (run_name, run) in &result.runs {
        let status = if run.success { "✓" } else { "✗" };
        println!("[{}] {}", status, run_name);
        for step in &run.steps {
            println!("    {:?}: {}", step.status, step.name);
        }
        for (key, value) in &run.outputs {
            println!("    output {} = {}", key, value);
        }
    }

    Ok(())
}
