//! Workflow types and definitions
//!
//! This module contains all types for defining workflows and evaluating
//! their dynamic parts:
//! - `job` - Workflow, Job, Step, and step-kind classification
//! - `event` - `on:` triggers and payload filters
//! - `matrix` - matrix cross-product expansion with include/exclude
//! - `action` - `uses:` reference parsing and action resolution
//! - `context` - per-run evaluation context
//! - `expressions` - expression evaluation for `${{ }}` syntax
//! - `loader` - load workflows from files and directories

pub mod action;
pub mod context;
pub mod event;
pub mod expressions;
pub mod job;
pub mod loader;
pub mod matrix;

// Re-export all public types for convenience
pub use action::{
    ActionInput, ActionManifest, ActionResolver, ActionRuns, FsActionResolver, ResolveError,
    ResolvedAction, UsesRef,
};
pub use context::ExecutionContext;
pub use event::{EventFilter, Trigger};
pub use expressions::{
    evaluate as evaluate_expression, evaluate_condition, evaluate_env, evaluate_params,
    ExpressionError,
};
pub use job::{Defaults, Job, RunDefaults, Step, StepKind, Strategy, Workflow};
pub use loader::{LoadError, WorkflowLoader};
pub use matrix::{Combination, Matrix};
