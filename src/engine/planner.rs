//! Workflow graph planner
//!
//! Builds the execution plan for a named event: jobs of every triggered
//! workflow become matrix-expanded runs, layered into stages so that each
//! run's dependencies all live in strictly earlier stages. Stages from
//! separate workflows are merged positionally, so independent workflows
//! still run side by side.
//!
//! Planning is pure: it only computes data and reports problems through
//! its `Result`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::workflow::matrix::{value_to_string, Combination};
use crate::workflow::{Job, Workflow};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Job '{job}' needs unknown job '{dependency}'")]
    UnresolvedNeeds { job: String, dependency: String },

    #[error("Cyclic dependency detected among jobs {0:?}")]
    CyclicDependency(Vec<String>),

    #[error("Event name must not be empty")]
    EmptyEventName,
}

/// One concrete execution instance of a job
#[derive(Debug, Clone)]
pub struct Run {
    pub workflow: Arc<Workflow>,
    pub job_id: String,
    /// Matrix axis values for this run; empty for jobs without a matrix
    pub matrix: Combination,
}

impl Run {
    pub fn job(&self) -> &Job {
        self.workflow
            .jobs
            .get(&self.job_id)
            .expect("plan only holds runs for jobs present in their workflow")
    }

    /// Workflow and job env merged, job wins; matrix values are applied by
    /// the executor through the expression context.
    pub fn static_env(&self) -> HashMap<String, String> {
        let mut env = self.workflow.env.clone();
        env.extend(self.job().env.clone());
        env
    }

    /// Run name: job id plus a deterministic matrix suffix
    pub fn display_name(&self) -> String {
        if self.matrix.is_empty() {
            return self.job_id.clone();
        }

        let mut keys: Vec<&String> = self.matrix.keys().collect();
        keys.sort();
        let suffix = keys
            .iter()
            .map(|k| format!("{}={}", k, value_to_string(&self.matrix[*k])))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} ({})", self.job_id, suffix)
    }
}

/// A scheduling level: all runs whose dependencies are satisfied by
/// earlier stages
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub runs: Vec<Run>,
}

impl Stage {
    pub fn job_ids(&self) -> Vec<&str> {
        self.runs.iter().map(|r| r.job_id.as_str()).collect()
    }
}

/// Ordered sequence of stages covering every job selected by an event
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub stages: Vec<Stage>,
}

impl Plan {
    /// Plan the given event across a set of workflows.
    ///
    /// Workflows whose triggers do not match contribute no runs; an event
    /// matching nothing yields an empty plan. Unresolved `needs` references
    /// and dependency cycles fail construction.
    pub fn build(
        workflows: &[Workflow],
        event_name: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<Plan, PlanError> {
        if event_name.is_empty() {
            return Err(PlanError::EmptyEventName);
        }

        let mut plan = Plan::default();
        for workflow in workflows {
            if !workflow.on.matches(event_name, payload) {
                continue;
            }
            let stages = plan_workflow(&Arc::new(workflow.clone()))?;
            plan.merge(stages);
        }

        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total number of runs across all stages
    pub fn run_count(&self) -> usize {
        self.stages.iter().map(|s| s.runs.len()).sum()
    }

    /// Merge another workflow's stage list positionally: its stage i joins
    /// this plan's stage i.
    fn merge(&mut self, stages: Vec<Stage>) {
        for (index, stage) in stages.into_iter().enumerate() {
            if index < self.stages.len() {
                self.stages[index].runs.extend(stage.runs);
            } else {
                self.stages.push(stage);
            }
        }
    }
}

/// Layer one workflow's jobs by repeatedly removing nodes with no
/// unsatisfied dependencies; each removal round becomes a stage.
fn plan_workflow(workflow: &Arc<Workflow>) -> Result<Vec<Stage>, PlanError> {
    for (job_id, job) in &workflow.jobs {
        for dependency in &job.needs {
            if !workflow.jobs.contains_key(dependency) {
                return Err(PlanError::UnresolvedNeeds {
                    job: job_id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (job_id, job) in &workflow.jobs {
        in_degree.entry(job_id.as_str()).or_insert(0);
        for dependency in &job.needs {
            *in_degree.entry(job_id.as_str()).or_insert(0) += 1;
            dependents
                .entry(dependency.as_str())
                .or_default()
                .push(job_id.as_str());
        }
    }

    let mut stages = Vec::new();
    let mut current_level: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&job_id, _)| job_id)
        .collect();
    current_level.sort();

    let mut processed = 0;
    while !current_level.is_empty() {
        processed += current_level.len();
        stages.push(expand_level(workflow, &current_level));

        let mut next_level = Vec::new();
        for job_id in &current_level {
            if let Some(deps) = dependents.get(job_id) {
                for &dependent in deps {
                    let degree = in_degree
                        .get_mut(dependent)
                        .expect("every job has an in-degree entry");
                    *degree -= 1;
                    if *degree == 0 {
                        next_level.push(dependent);
                    }
                }
            }
        }
        next_level.sort();
        current_level = next_level;
    }

    if processed != workflow.jobs.len() {
        let mut remaining: Vec<String> = workflow
            .jobs
            .keys()
            .filter(|id| in_degree.get(id.as_str()).is_some_and(|&d| d > 0))
            .cloned()
            .collect();
        remaining.sort();
        return Err(PlanError::CyclicDependency(remaining));
    }

    Ok(stages)
}

/// Expand one removal round into a stage of matrix-resolved runs
fn expand_level(workflow: &Arc<Workflow>, job_ids: &[&str]) -> Stage {
    let mut runs = Vec::new();

    for &job_id in job_ids {
        let job = &workflow.jobs[job_id];
        let combinations = match &job.strategy {
            Some(strategy) => strategy.matrix.expand(),
            None => vec![Combination::new()],
        };

        for matrix in combinations {
            runs.push(Run {
                workflow: workflow.clone(),
                job_id: job_id.to_string(),
                matrix,
            });
        }
    }

    Stage { runs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(yaml: &str) -> Workflow {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_pipeline_stages() {
        let wf = workflow(
            r#"
name: ci
on: push
jobs:
  check:
    steps:
      - run: make check
  build:
    needs: check
    steps:
      - run: make build
  test:
    needs: [check, build]
    steps:
      - run: make test
"#,
        );

        let plan = Plan::build(&[wf], "push", None).unwrap();
        assert_eq!(plan.stages.len(), 3);
        assert_eq!(plan.stages[0].job_ids(), vec!["check"]);
        assert_eq!(plan.stages[1].job_ids(), vec!["build"]);
        assert_eq!(plan.stages[2].job_ids(), vec!["test"]);
    }

    #[test]
    fn test_non_matching_event_yields_empty_plan() {
        let wf = workflow(
            "name: ci\non: push\njobs:\n  build:\n    steps:\n      - run: make\n",
        );
        let plan = Plan::build(&[wf], "release", None).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_event_name_is_error() {
        let wf = workflow(
            "name: ci\non: push\njobs:\n  build:\n    steps:\n      - run: make\n",
        );
        assert!(matches!(
            Plan::build(&[wf], "", None),
            Err(PlanError::EmptyEventName)
        ));
    }

    #[test]
    fn test_cycle_is_error() {
        let wf = workflow(
            r#"
name: cyclic
on: push
jobs:
  a:
    needs: c
    steps:
      - run: "true"
  b:
    needs: a
    steps:
      - run: "true"
  c:
    needs: b
    steps:
      - run: "true"
"#,
        );
        assert!(matches!(
            Plan::build(&[wf], "push", None),
            Err(PlanError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_unresolved_needs_is_error() {
        let wf = workflow(
            "name: ci\non: push\njobs:\n  build:\n    needs: ghost\n    steps:\n      - run: make\n",
        );
        assert!(matches!(
            Plan::build(&[wf], "push", None),
            Err(PlanError::UnresolvedNeeds { .. })
        ));
    }

    #[test]
    fn test_run_static_env_merges_job_over_workflow() {
        let wf = workflow(
            r#"
name: env-layers
on: push
env:
  SHARED: workflow
  LEVEL: workflow
jobs:
  build:
    env:
      LEVEL: job
    steps:
      - run: env
"#,
        );

        let plan = Plan::build(&[wf], "push", None).unwrap();
        let env = plan.stages[0].runs[0].static_env();
        assert_eq!(env.get("SHARED"), Some(&"workflow".to_string()));
        assert_eq!(env.get("LEVEL"), Some(&"job".to_string()));
    }

    #[test]
    fn test_run_display_name() {
        let wf = workflow(
            r#"
name: matrixed
on: push
jobs:
  build:
    strategy:
      matrix:
        os: [a]
        flag: [x]
    steps:
      - run: make
"#,
        );

        let plan = Plan::build(&[wf], "push", None).unwrap();
        assert_eq!(plan.stages[0].runs[0].display_name(), "build (flag=x, os=a)");
    }
}
