//! Workflow, Job, and Step definitions
//!
//! The in-memory model for workflow documents: a workflow declares which
//! events trigger it and a set of jobs keyed by id; each job carries an
//! ordered sequence of steps, its dependencies (`needs`), an optional
//! matrix strategy, and per-job defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::action::UsesRef;
use super::event::Trigger;
use super::matrix::Matrix;

// ============================================================================
// Workflow
// ============================================================================

/// A complete workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name (required)
    pub name: String,

    /// Events that trigger this workflow
    #[serde(default, rename = "on")]
    pub on: Trigger,

    /// Environment variables available to all jobs
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Default settings for all jobs
    #[serde(default)]
    pub defaults: Option<Defaults>,

    /// Jobs to execute, keyed by job id
    pub jobs: HashMap<String, Job>,
}

impl Workflow {
    /// Default shell for `run` steps, if one is declared at workflow level
    pub fn default_shell(&self) -> Option<&str> {
        self.defaults.as_ref()?.run.shell.as_deref()
    }

    /// Default working directory for `run` steps, if declared at workflow level
    pub fn default_working_directory(&self) -> Option<&str> {
        self.defaults.as_ref()?.run.working_directory.as_deref()
    }
}

/// `defaults:` block shared by workflows and jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub run: RunDefaults,
}

/// Defaults applied to `run` steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunDefaults {
    pub shell: Option<String>,
    pub working_directory: Option<String>,
}

// ============================================================================
// Job
// ============================================================================

/// A job contains multiple steps and declares its dependencies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Human-readable name
    pub name: Option<String>,

    /// Runner label resolved to a container image through the runner config
    #[serde(default = "default_runs_on")]
    pub runs_on: String,

    /// Jobs this job depends on (single id or list)
    #[serde(default, deserialize_with = "deserialize_needs")]
    pub needs: Vec<String>,

    /// Matrix strategy expanding this job into multiple runs
    pub strategy: Option<Strategy>,

    /// Condition to run this job
    #[serde(rename = "if")]
    pub condition: Option<String>,

    /// Job-level environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Default settings for this job's steps
    pub defaults: Option<Defaults>,

    /// Output values exposed to dependent jobs, as expressions
    #[serde(default)]
    pub outputs: HashMap<String, String>,

    /// Treat this job's failure as tolerable at the stage level
    #[serde(default)]
    pub continue_on_error: bool,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_runs_on() -> String {
    "ubuntu-latest".to_string()
}

fn deserialize_needs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NeedsHelper {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<NeedsHelper>::deserialize(deserializer)? {
        None => vec![],
        Some(NeedsHelper::One(id)) => vec![id],
        Some(NeedsHelper::Many(ids)) => ids,
    })
}

impl Job {
    /// Shell for `run` steps, falling back to the workflow default
    pub fn shell<'a>(&'a self, workflow: &'a Workflow) -> Option<&'a str> {
        self.defaults
            .as_ref()
            .and_then(|d| d.run.shell.as_deref())
            .or_else(|| workflow.default_shell())
    }

    /// Working directory for `run` steps, falling back to the workflow default
    pub fn working_directory<'a>(&'a self, workflow: &'a Workflow) -> Option<&'a str> {
        self.defaults
            .as_ref()
            .and_then(|d| d.run.working_directory.as_deref())
            .or_else(|| workflow.default_working_directory())
    }
}

/// Job `strategy:` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub matrix: Matrix,
}

// ============================================================================
// Step
// ============================================================================

/// A single step in a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Step name (for logging)
    pub name: Option<String>,

    /// ID for referencing outputs
    pub id: Option<String>,

    /// Action reference (`docker://image`, `./local/path`, `owner/repo@ref`)
    pub uses: Option<String>,

    /// Shell command to run in the job sandbox
    pub run: Option<String>,

    /// Shell override for this step
    pub shell: Option<String>,

    /// Working directory override for this step, relative to the workspace
    pub working_directory: Option<String>,

    /// Action input values
    #[serde(default)]
    pub with: HashMap<String, serde_yaml::Value>,

    /// Step-level environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Condition to run this step; defaults to `success()`
    #[serde(rename = "if")]
    pub condition: Option<String>,

    /// Record a failure of this step without failing the run
    #[serde(default)]
    pub continue_on_error: bool,
}

/// The closed set of step kinds the executor dispatches over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// `run:` command executed through the job shell
    Command,
    /// `uses: docker://image` container action
    ContainerAction { image: String },
    /// `uses: ./path` action resolved from the local filesystem
    LocalAction { path: String },
    /// `uses: owner/repo[/path]@ref` action fetched by reference
    RemoteAction { reference: UsesRef },
}

impl Step {
    /// Classify this step for dispatch
    pub fn kind(&self) -> Result<StepKind, String> {
        match (&self.run, &self.uses) {
            (Some(_), None) => Ok(StepKind::Command),
            (None, Some(uses)) => match UsesRef::parse(uses)? {
                UsesRef::Docker { image } => Ok(StepKind::ContainerAction { image }),
                UsesRef::Local { path } => Ok(StepKind::LocalAction { path }),
                reference @ UsesRef::Remote { .. } => Ok(StepKind::RemoteAction { reference }),
            },
            (Some(_), Some(_)) => Err("step declares both `run` and `uses`".to_string()),
            (None, None) => Err("step declares neither `run` nor `uses`".to_string()),
        }
    }

    /// Display name used in logs and results
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(uses) = &self.uses {
            return uses.clone();
        }
        match &self.run {
            Some(script) => script.lines().next().unwrap_or("run").to_string(),
            None => "step".to_string(),
        }
    }
}
