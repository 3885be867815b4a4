//! # Local Actions
//!
//! A GitHub Actions-style local workflow runner: plans event-triggered,
//! multi-job workflows into dependency-ordered stages and executes them in
//! isolated container sandboxes, without a remote execution service.
//!
//! ## Features
//!
//! - **Event planning** - `on:` triggers with payload filters select jobs,
//!   dependencies layer into stages, matrices expand into runs
//! - **Staged execution** - stages run in order, runs within a stage run
//!   concurrently, steps within a run stay strictly sequential
//! - **Heterogeneous steps** - shell commands, container actions, node
//!   script actions, composite actions, local and remote action references
//! - **Sandbox reuse** - containers keyed by (job, image, architecture) can
//!   be kept for later runs within an invocation
//! - **Expression syntax** - `${{ }}` for env, secrets, matrix values, step
//!   and dependency outputs, and event payload fields
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//!
//! use local_actions::engine::CancellationToken;
//! use local_actions::{Plan, PlanExecutor, RunnerConfig, WorkflowLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let workflows = WorkflowLoader::load_directory(Path::new(".github/workflows"))?;
//!
//!     let config = RunnerConfig {
//!         workdir: PathBuf::from("."),
//!         event_name: "push".to_string(),
//!         platforms: [("ubuntu-latest".to_string(), "node:16-buster-slim".to_string())]
//!             .into_iter()
//!             .collect(),
//!         ..Default::default()
//!     };
//!
//!     let plan = Plan::build(&workflows, "push", None)?;
//!     let executor = PlanExecutor::new(config)?;
//!     let result = executor.execute(&plan, CancellationToken::new()).await?;
//!
//!     println!("plan finished: success={}", result.success);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod workflow;

// Re-export main types
pub use engine::{
    container_path, ConfigError, ExecutionObserver, ExecutorError, Plan, PlanError, PlanExecutor,
    PlanResult, Run, RunResult, RunnerConfig, Stage, StepResult, StepStatus, TracingObserver,
};
pub use workflow::{
    ActionResolver, ExecutionContext, FsActionResolver, Job, LoadError, Matrix, ResolvedAction,
    Step, StepKind, Trigger, UsesRef, Workflow, WorkflowLoader,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{
        container_path, CancellationToken, ContainerRuntime, ExecutionObserver, ExecutorError,
        Plan, PlanError, PlanExecutor, PlanResult, RunnerConfig, Sandbox, StepStatus,
    };
    pub use crate::workflow::{
        ActionResolver, Job, LoadError, Matrix, Step, StepKind, Trigger, Workflow, WorkflowLoader,
    };
}
