//! Plan a workflow directory for an event and print the stages
//!
//! Run with: cargo run --example plan_event -- <workflow-dir> <event>

use std::path::Path;

use local_actions::{Plan, WorkflowLoader};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| ".github/workflows".to_string());
    let event = args.next().unwrap_or_else(|| "push".to_string());

    let workflows = WorkflowLoader::load_directory(Path::new(&dir))?;
    println!("Loaded {} workflow(s) from {}", workflows.len(), dir);

    let plan = Plan::build(&workflows, &event, None)?;
    if plan.is_empty() {
        println!("No jobs are triggered by '{}'", event);
        return Ok(());
    }

    println!(
        "Plan for '{}': {} stage(s), {} run(s)",
        event,
        plan.stages.len(),
        plan.run_count()
    );
    for (index, stage) in plan.stages.iter().enumerate() {
        println!("  Stage {}:", index);
        for run in &stage.runs {
            println!("    - {}", run.display_name());
        }
    }

    Ok(())
}
