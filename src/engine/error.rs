//! Engine error types

use crate::workflow::expressions::ExpressionError;
use crate::workflow::ResolveError;

use super::config::ConfigError;
use super::planner::PlanError;
use super::sandbox::SandboxError;

/// Errors that can occur while executing a plan
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Action resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("No image bound for runner label '{0}'")]
    UnknownRunnerLabel(String),

    #[error("Step failed: {0}")]
    StepFailed(String),

    #[error("Job '{job}' declares output '{output}' which did not evaluate")]
    MissingOutput { job: String, output: String },

    #[error("Execution cancelled")]
    Cancelled,
}

impl ExecutorError {
    /// Cancellation is reported distinctly and never folded into a step or
    /// provisioning failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutorError::Cancelled)
    }
}
