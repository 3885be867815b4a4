//! Execution observers
//!
//! The engine reports progress through an injected sink instead of ambient
//! global state, so harnesses can capture structured events. The default
//! sink forwards to `tracing`.

use tracing::{error, info};

use super::result::StepStatus;

/// Structured execution events emitted by the engine.
///
/// Step output passed to `on_step_output` already has secret and masked
/// values redacted.
pub trait ExecutionObserver: Send + Sync {
    fn on_stage_started(&self, _index: usize, _run_count: usize) {}
    fn on_run_started(&self, _run_name: &str) {}
    fn on_run_finished(&self, _run_name: &str, _success: bool) {}
    fn on_step_started(&self, _run_name: &str, _step_name: &str) {}
    fn on_step_finished(&self, _run_name: &str, _step_name: &str, _status: StepStatus) {}
    fn on_step_output(&self, _run_name: &str, _line: &str) {}
}

/// Forwards execution events to `tracing`
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_stage_started(&self, index: usize, run_count: usize) {
        info!("Stage {} started ({} runs)", index, run_count);
    }

    fn on_run_started(&self, run_name: &str) {
        info!("[{}] started", run_name);
    }

    fn on_run_finished(&self, run_name: &str, success: bool) {
        if success {
            info!("[{}] succeeded", run_name);
        } else {
            error!("[{}] failed", run_name);
        }
    }

    fn on_step_started(&self, run_name: &str, step_name: &str) {
        info!("[{}] step: {}", run_name, step_name);
    }

    fn on_step_finished(&self, run_name: &str, step_name: &str, status: StepStatus) {
        match status {
            StepStatus::Success => info!("[{}] step '{}' succeeded", run_name, step_name),
            StepStatus::Failure => error!("[{}] step '{}' failed", run_name, step_name),
            StepStatus::Skipped => info!("[{}] step '{}' skipped", run_name, step_name),
        }
    }

    fn on_step_output(&self, run_name: &str, line: &str) {
        info!("[{}] | {}", run_name, line);
    }
}
