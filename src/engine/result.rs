//! Execution result types

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Recorded status of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Failure,
    Skipped,
}

/// Result of a step execution
#[derive(Debug, Clone)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub outputs: HashMap<String, String>,
    pub error: Option<String>,
}

impl StepResult {
    pub fn skipped(name: String) -> Self {
        Self {
            name,
            status: StepStatus::Skipped,
            outputs: HashMap::new(),
            error: None,
        }
    }
}

/// Result of one run (a matrix-resolved job instance)
#[derive(Debug, Clone)]
pub struct RunResult {
    pub job_id: String,
    pub name: String,
    pub success: bool,
    /// Job condition evaluated false; no steps were attempted
    pub skipped: bool,
    pub steps: Vec<StepResult>,
    pub outputs: HashMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub error: Option<String>,
}

/// Result of a full plan execution
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub success: bool,
    /// Run results keyed by run name (job id plus matrix suffix)
    pub runs: HashMap<String, RunResult>,
    /// Description of the first fatal run failure
    pub first_error: Option<String>,
    pub plan_id: String,
}

impl PlanResult {
    /// Look up an output by job id and output name. For matrix jobs, any
    /// run of the job that produced the output satisfies the lookup.
    pub fn job_output(&self, job_id: &str, name: &str) -> Option<&str> {
        self.runs
            .values()
            .filter(|run| run.job_id == job_id)
            .find_map(|run| run.outputs.get(name))
            .map(|s| s.as_str())
    }

    /// All results for one job id
    pub fn job_runs(&self, job_id: &str) -> Vec<&RunResult> {
        self.runs
            .values()
            .filter(|run| run.job_id == job_id)
            .collect()
    }
}
