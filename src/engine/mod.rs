//! Plan construction and execution engine
//!
//! This module contains:
//! - `planner` - event planning into stages of matrix-expanded runs
//! - `executor` - the stage-based plan executor
//! - `config` - immutable per-invocation runner configuration
//! - `paths` - host to sandbox path translation
//! - `sandbox` - container runtime seam and the keyed reuse pool
//! - `commands` - workflow commands parsed from step output
//! - `observer` - structured execution event sink
//! - `error` / `result` - error taxonomy and result types

pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod observer;
pub mod paths;
pub mod planner;
pub mod result;
pub mod sandbox;

// Cancellation is threaded explicitly through plan execution.
pub use tokio_util::sync::CancellationToken;

pub use commands::{mask, parse_commands, WorkflowCommand};
pub use config::{ConfigError, RunnerConfig};
pub use error::ExecutorError;
pub use executor::PlanExecutor;
pub use observer::{ExecutionObserver, TracingObserver};
pub use paths::container_path;
pub use planner::{Plan, PlanError, Run, Stage};
pub use result::{PlanResult, RunResult, StepResult, StepStatus};
pub use sandbox::{
    ContainerRuntime, DockerCli, ExecOutput, Mount, PoolKey, Sandbox, SandboxError, SandboxPool,
    SandboxSpec,
};
