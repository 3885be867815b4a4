//! Plan executor
//!
//! Drives a plan stage by stage:
//! 1. Stages execute strictly in plan order
//! 2. Runs within a stage execute concurrently, one task per run
//! 3. Steps within a run execute strictly in declared order
//! 4. A fatal run failure finishes the running stage, then aborts the plan
//!
//! Each run owns its evaluation context and sandbox handle; the only state
//! shared between concurrent runs is the keyed sandbox reuse pool.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::workflow::expressions::{
    evaluate, evaluate_condition, evaluate_env, evaluate_params,
};
use crate::workflow::matrix::value_to_string;
use crate::workflow::{
    ActionInput, ActionResolver, ExecutionContext, FsActionResolver, ResolvedAction, Step,
    StepKind, UsesRef,
};

use super::commands::{mask, parse_commands, WorkflowCommand};
use super::config::RunnerConfig;
use super::error::ExecutorError;
use super::observer::{ExecutionObserver, TracingObserver};
use super::planner::{Plan, Run};
use super::result::{PlanResult, RunResult, StepResult, StepStatus};
use super::sandbox::{
    ContainerRuntime, DockerCli, ExecOutput, Mount, PoolKey, Sandbox, SandboxError, SandboxPool,
    SandboxSpec,
};

/// Executes plans against a runner configuration
pub struct PlanExecutor {
    worker: RunWorker,
}

impl PlanExecutor {
    /// Create an executor backed by the local docker binary
    pub fn new(config: RunnerConfig) -> Result<Self, ExecutorError> {
        let resolver: Arc<dyn ActionResolver> = Arc::new(FsActionResolver::new(&config.workdir));
        let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli::new()?);
        Self::with_runtime(config, runtime, resolver)
    }

    /// Create an executor with explicit runtime and resolver implementations
    pub fn with_runtime(
        config: RunnerConfig,
        runtime: Arc<dyn ContainerRuntime>,
        resolver: Arc<dyn ActionResolver>,
    ) -> Result<Self, ExecutorError> {
        config.validate()?;
        let event = config.load_event_payload()?;

        Ok(Self {
            worker: RunWorker {
                config: Arc::new(config),
                runtime,
                resolver,
                observer: Arc::new(TracingObserver),
                pool: Arc::new(SandboxPool::new()),
                event: Arc::new(event),
            },
        })
    }

    /// Replace the execution event sink
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.worker.observer = observer;
        self
    }

    /// Execute a plan to completion or first fatal stage failure.
    ///
    /// Cancellation stops in-flight steps, starts nothing new, tears down
    /// pooled sandboxes, and surfaces as `ExecutorError::Cancelled`.
    #[instrument(skip(self, plan, cancel), fields(stages = plan.stages.len()))]
    pub async fn execute(
        &self,
        plan: &Plan,
        cancel: CancellationToken,
    ) -> Result<PlanResult, ExecutorError> {
        let plan_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Executing plan {} ({} stages, {} runs)",
            plan_id,
            plan.stages.len(),
            plan.run_count()
        );

        let mut runs: HashMap<String, RunResult> = HashMap::new();
        let mut outputs_by_job: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut first_error: Option<String> = None;

        for (index, stage) in plan.stages.iter().enumerate() {
            if cancel.is_cancelled() {
                self.worker.pool.teardown().await;
                return Err(ExecutorError::Cancelled);
            }

            self.worker.observer.on_stage_started(index, stage.runs.len());

            // Dependency outputs are frozen between stages; every run in this
            // stage reads the same snapshot.
            let dep_outputs = Arc::new(outputs_by_job.clone());

            let handles: Vec<_> = stage
                .runs
                .iter()
                .map(|run| {
                    let worker = self.worker.clone();
                    let run = run.clone();
                    let plan_id = plan_id.clone();
                    let dep_outputs = dep_outputs.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        worker.execute_run(&run, &plan_id, &dep_outputs, &cancel).await
                    })
                })
                .collect();

            let stage_results = join_all(handles).await;

            let mut cancelled = false;
            for (run, joined) in stage.runs.iter().zip(stage_results) {
                let result = match joined {
                    Ok(result) => result,
                    Err(join_error) => Err(ExecutorError::StepFailed(format!(
                        "run task panicked: {}",
                        join_error
                    ))),
                };

                let run_result = match result {
                    Ok(run_result) => run_result,
                    Err(e) if e.is_cancelled() => {
                        cancelled = true;
                        continue;
                    }
                    Err(e) => RunResult {
                        job_id: run.job_id.clone(),
                        name: run.display_name(),
                        success: false,
                        skipped: false,
                        steps: vec![],
                        outputs: HashMap::new(),
                        started_at: Utc::now(),
                        error: Some(e.to_string()),
                    },
                };

                if !run_result.success && !run.job().continue_on_error && first_error.is_none() {
                    first_error = Some(match &run_result.error {
                        Some(message) => format!("{}: {}", run_result.name, message),
                        None => format!("{}: run failed", run_result.name),
                    });
                }

                outputs_by_job
                    .entry(run_result.job_id.clone())
                    .or_default()
                    .extend(run_result.outputs.clone());
                runs.insert(run_result.name.clone(), run_result);
            }

            if cancelled {
                self.worker.pool.teardown().await;
                return Err(ExecutorError::Cancelled);
            }

            if first_error.is_some() {
                debug!("Aborting after stage {}: {:?}", index, first_error);
                break;
            }
        }

        Ok(PlanResult {
            success: first_error.is_none(),
            runs,
            first_error,
            plan_id,
        })
    }

    /// Remove sandboxes retained for reuse within this invocation
    pub async fn teardown(&self) {
        self.worker.pool.teardown().await;
    }
}

// ============================================================================
// Per-run execution
// ============================================================================

/// Everything a spawned run task needs, cheap to clone
#[derive(Clone)]
struct RunWorker {
    config: Arc<RunnerConfig>,
    runtime: Arc<dyn ContainerRuntime>,
    resolver: Arc<dyn ActionResolver>,
    observer: Arc<dyn ExecutionObserver>,
    pool: Arc<SandboxPool>,
    event: Arc<Option<serde_json::Value>>,
}

/// Mutable state owned by one run's task
struct RunState {
    run_name: String,
    sandbox: Option<Arc<dyn Sandbox>>,
    owns_sandbox: bool,
    masks: Vec<String>,
    steps: Vec<StepResult>,
    fatal_error: Option<String>,
}

impl RunWorker {
    async fn execute_run(
        &self,
        run: &Run,
        plan_id: &str,
        dep_outputs: &HashMap<String, HashMap<String, String>>,
        cancel: &CancellationToken,
    ) -> Result<RunResult, ExecutorError> {
        let name = run.display_name();
        let started_at = Utc::now();
        self.observer.on_run_started(&name);

        let mut state = RunState {
            run_name: name.clone(),
            sandbox: None,
            owns_sandbox: false,
            masks: self.config.secrets.values().cloned().collect(),
            steps: Vec::new(),
            fatal_error: None,
        };

        let outcome = self
            .try_execute_run(run, plan_id, dep_outputs, cancel, &mut state)
            .await;

        // Run-owned sandboxes go away at run end; pooled ones stay keyed
        // for later runs of the same (job, image, architecture).
        if let Some(sandbox) = state.sandbox.take() {
            if state.owns_sandbox {
                if let Err(e) = sandbox.remove().await {
                    warn!("Failed to remove sandbox for '{}': {}", name, e);
                }
            }
        }

        let result = match outcome {
            Ok(run_result) => run_result,
            Err(e) if e.is_cancelled() => {
                self.observer.on_run_finished(&name, false);
                return Err(e);
            }
            Err(e) => RunResult {
                job_id: run.job_id.clone(),
                name: name.clone(),
                success: false,
                skipped: false,
                steps: std::mem::take(&mut state.steps),
                outputs: HashMap::new(),
                started_at,
                error: Some(e.to_string()),
            },
        };

        self.observer.on_run_finished(&name, result.success);
        Ok(result)
    }

    async fn try_execute_run(
        &self,
        run: &Run,
        plan_id: &str,
        dep_outputs: &HashMap<String, HashMap<String, String>>,
        cancel: &CancellationToken,
        state: &mut RunState,
    ) -> Result<RunResult, ExecutorError> {
        let started_at = Utc::now();
        let job = run.job();

        let mut ctx = ExecutionContext {
            event_name: self.config.event_name.clone(),
            event: (*self.event).clone(),
            run_id: plan_id.to_string(),
            workspace: self.config.container_workdir(),
            secrets: self.config.secrets.clone(),
            ..Default::default()
        };
        ctx.matrix = run
            .matrix
            .iter()
            .map(|(key, value)| (key.clone(), value_to_string(value)))
            .collect();
        for dependency in &job.needs {
            ctx.needs.insert(
                dependency.clone(),
                dep_outputs.get(dependency).cloned().unwrap_or_default(),
            );
        }

        // Environment overlays: config under workflow under job; later
        // overlays may reference the earlier ones and the matrix.
        ctx.env = self.config.env.clone();
        let workflow_env = evaluate_env(&run.workflow.env, &ctx)?;
        ctx.merge_env(&workflow_env);
        let job_env = evaluate_env(&job.env, &ctx)?;
        ctx.merge_env(&job_env);

        if let Some(condition) = &job.condition {
            if !evaluate_condition(condition, &ctx)? {
                info!("[{}] skipped by job condition", state.run_name);
                return Ok(RunResult {
                    job_id: run.job_id.clone(),
                    name: state.run_name.clone(),
                    success: true,
                    skipped: true,
                    steps: vec![],
                    outputs: HashMap::new(),
                    started_at,
                    error: None,
                });
            }
        }

        self.execute_steps(run, &job.steps, &mut ctx, state, cancel)
            .await?;

        let mut outputs = HashMap::new();
        if !ctx.failed {
            for (output_name, expression) in &job.outputs {
                let value = evaluate(expression, &ctx)?;
                if value.is_empty() {
                    ctx.failed = true;
                    state.fatal_error = Some(
                        ExecutorError::MissingOutput {
                            job: run.job_id.clone(),
                            output: output_name.clone(),
                        }
                        .to_string(),
                    );
                    break;
                }
                outputs.insert(output_name.clone(), value);
            }
        }

        Ok(RunResult {
            job_id: run.job_id.clone(),
            name: state.run_name.clone(),
            success: !ctx.failed,
            skipped: false,
            steps: std::mem::take(&mut state.steps),
            outputs,
            started_at,
            error: state.fatal_error.clone(),
        })
    }

    /// Execute a step sequence in declared order. Boxed so composite actions
    /// can expand in place recursively.
    fn execute_steps<'a>(
        &'a self,
        run: &'a Run,
        steps: &'a [Step],
        ctx: &'a mut ExecutionContext,
        state: &'a mut RunState,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), ExecutorError>> {
        Box::pin(async move {
            for step in steps {
                if cancel.is_cancelled() {
                    ctx.cancelled = true;
                    return Err(ExecutorError::Cancelled);
                }

                let step_name = step.display_name();
                let condition = step.condition.as_deref().unwrap_or("success()");
                let proceed = match evaluate_condition(condition, ctx) {
                    Ok(proceed) => proceed,
                    Err(e) => {
                        self.record_step_failure(step, &step_name, e.to_string(), ctx, state);
                        continue;
                    }
                };

                if !proceed {
                    state.steps.push(StepResult::skipped(step_name.clone()));
                    self.observer
                        .on_step_finished(&state.run_name, &step_name, StepStatus::Skipped);
                    continue;
                }

                self.observer.on_step_started(&state.run_name, &step_name);
                match self.dispatch_step(run, step, ctx, state, cancel).await {
                    Ok(outputs) => {
                        state.steps.push(StepResult {
                            name: step_name.clone(),
                            status: StepStatus::Success,
                            outputs,
                            error: None,
                        });
                        self.observer.on_step_finished(
                            &state.run_name,
                            &step_name,
                            StepStatus::Success,
                        );
                    }
                    Err(e) if e.is_cancelled() => {
                        ctx.cancelled = true;
                        return Err(e);
                    }
                    Err(e) => {
                        self.record_step_failure(step, &step_name, e.to_string(), ctx, state);
                    }
                }
            }
            Ok(())
        })
    }

    fn record_step_failure(
        &self,
        step: &Step,
        step_name: &str,
        message: String,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
    ) {
        state.steps.push(StepResult {
            name: step_name.to_string(),
            status: StepStatus::Failure,
            outputs: HashMap::new(),
            error: Some(message.clone()),
        });
        self.observer
            .on_step_finished(&state.run_name, step_name, StepStatus::Failure);

        if step.continue_on_error {
            debug!(
                "[{}] step '{}' failed, continue-on-error set",
                state.run_name, step_name
            );
        } else {
            ctx.failed = true;
            if state.fatal_error.is_none() {
                state.fatal_error = Some(format!("step '{}': {}", step_name, message));
            }
        }
    }

    /// Dispatch one step by its kind
    async fn dispatch_step(
        &self,
        run: &Run,
        step: &Step,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        match step.kind().map_err(ExecutorError::StepFailed)? {
            StepKind::Command => self.run_command_step(run, step, ctx, state, cancel).await,
            StepKind::ContainerAction { image } => {
                let action = ResolvedAction::Container {
                    image,
                    entrypoint: None,
                    args: vec![],
                    inputs: HashMap::new(),
                };
                self.run_resolved_action(run, step, action, ctx, state, cancel)
                    .await
            }
            StepKind::LocalAction { path } => {
                let resolved = self.resolver.resolve(&UsesRef::Local { path }).await?;
                self.run_resolved_action(run, step, resolved, ctx, state, cancel)
                    .await
            }
            StepKind::RemoteAction { reference } => {
                let resolved = self.resolver.resolve(&reference).await?;
                self.run_resolved_action(run, step, resolved, ctx, state, cancel)
                    .await
            }
        }
    }

    /// Run a `run:` step through the job shell inside the job sandbox
    async fn run_command_step(
        &self,
        run: &Run,
        step: &Step,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        let sandbox = self.job_sandbox(run, state).await?;

        let script = evaluate(step.run.as_deref().unwrap_or_default(), ctx)?;
        let shell = step
            .shell
            .as_deref()
            .or_else(|| run.job().shell(&run.workflow))
            .unwrap_or("bash");
        let command = shell_command(shell, &script);
        let workdir = self.step_workdir(run, step);
        let env = self.step_env(step, ctx)?;

        let output =
            exec_cancellable(cancel, sandbox.exec(&command, &env, Some(&workdir))).await?;
        self.finish_exec(step, output, ctx, state)
    }

    async fn run_resolved_action(
        &self,
        run: &Run,
        step: &Step,
        action: ResolvedAction,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        match action {
            ResolvedAction::Container {
                image,
                entrypoint,
                args,
                inputs,
            } => {
                let mut env = self.step_env(step, ctx)?;
                env.extend(self.inputs_env(step, &inputs, ctx)?);

                let args = args
                    .iter()
                    .map(|arg| evaluate(arg, ctx))
                    .collect::<Result<Vec<_>, _>>()?;

                let spec = self.sandbox_spec(run, &image, entrypoint);
                let output =
                    exec_cancellable(cancel, self.runtime.run_once(&spec, &env, &args)).await?;
                self.finish_exec(step, output, ctx, state)
            }

            ResolvedAction::Script {
                runtime,
                dir,
                main,
                inputs,
            } => {
                let sandbox = self.job_sandbox(run, state).await?;

                let digest = Sha256::digest(dir.to_string_lossy().as_bytes());
                let dest = format!("/tmp/local-actions/{}", hex::encode(&digest[..8]));
                let mkdir = ["mkdir", "-p", dest.as_str()].map(String::from);
                let no_env = HashMap::new();
                exec_cancellable(cancel, sandbox.exec(&mkdir, &no_env, None)).await?;
                exec_cancellable(cancel, sandbox.copy_into(&dir, &dest)).await?;

                let mut env = self.step_env(step, ctx)?;
                env.extend(self.inputs_env(step, &inputs, ctx)?);

                let command = vec![runtime, format!("{}/{}", dest, main)];
                let workdir = self.step_workdir(run, step);
                let output =
                    exec_cancellable(cancel, sandbox.exec(&command, &env, Some(&workdir)))
                        .await?;
                self.finish_exec(step, output, ctx, state)
            }

            ResolvedAction::Composite { steps, inputs } => {
                // Nested steps inherit the run's environment plus the action
                // inputs; the inputs overlay is scoped to the expansion.
                let inputs_env = self.inputs_env(step, &inputs, ctx)?;
                let previous: HashMap<String, Option<String>> = inputs_env
                    .keys()
                    .map(|key| (key.clone(), ctx.env.get(key).cloned()))
                    .collect();
                ctx.merge_env(&inputs_env);

                let outer_failed = ctx.failed;
                ctx.failed = false;
                let result = self.execute_steps(run, &steps, ctx, state, cancel).await;
                let nested_failed = ctx.failed;
                ctx.failed = outer_failed;

                for (key, old) in previous {
                    match old {
                        Some(value) => {
                            ctx.env.insert(key, value);
                        }
                        None => {
                            ctx.env.remove(&key);
                        }
                    }
                }

                result?;
                if nested_failed {
                    Err(ExecutorError::StepFailed(
                        "composite action step failed".to_string(),
                    ))
                } else {
                    Ok(HashMap::new())
                }
            }
        }
    }

    /// Apply workflow commands from captured output, emit masked log lines,
    /// and convert the exit status into the step outcome
    fn finish_exec(
        &self,
        step: &Step,
        output: ExecOutput,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        let mut outputs = HashMap::new();

        for command in parse_commands(&output.stdout) {
            match command {
                WorkflowCommand::SetOutput { name, value } => {
                    if let Some(step_id) = &step.id {
                        ctx.set_output(step_id, &name, value.clone());
                    }
                    outputs.insert(name, value);
                }
                WorkflowCommand::SetEnv { name, value } => {
                    ctx.env.insert(name, value);
                }
                WorkflowCommand::AddMask { value } => {
                    state.masks.push(value);
                }
            }
        }

        for line in output.stdout.lines().chain(output.stderr.lines()) {
            // Command lines are consumed above and may carry values to mask.
            if line.trim_start().starts_with("::") {
                continue;
            }
            self.observer
                .on_step_output(&state.run_name, &mask(line, &state.masks));
        }

        if output.success() {
            Ok(outputs)
        } else {
            Err(ExecutorError::StepFailed(format!(
                "exit with `FAILURE`: {}",
                output.exit_code
            )))
        }
    }

    /// The job sandbox, provisioned lazily at the first step that needs it
    async fn job_sandbox(
        &self,
        run: &Run,
        state: &mut RunState,
    ) -> Result<Arc<dyn Sandbox>, ExecutorError> {
        if let Some(sandbox) = &state.sandbox {
            return Ok(sandbox.clone());
        }

        let label = &run.job().runs_on;
        let image = self
            .config
            .image_for(label)
            .ok_or_else(|| ExecutorError::UnknownRunnerLabel(label.clone()))?
            .to_string();
        let spec = self.sandbox_spec(run, &image, None);

        let sandbox = if self.config.reuse_sandboxes {
            let key = PoolKey {
                job_id: run.job_id.clone(),
                image: image.clone(),
                architecture: self.config.container_architecture.clone(),
            };
            self.pool
                .get_or_create(key, || self.provision(spec))
                .await?
        } else {
            self.provision(spec).await?
        };

        state.owns_sandbox = !self.config.reuse_sandboxes;
        state.sandbox = Some(sandbox.clone());
        Ok(sandbox)
    }

    async fn provision(&self, spec: SandboxSpec) -> Result<Arc<dyn Sandbox>, SandboxError> {
        let sandbox = self.runtime.create(&spec).await?;
        if !self.config.bind_workdir {
            sandbox
                .copy_into(&self.config.workdir, &self.config.container_workdir())
                .await?;
        }
        Ok(sandbox)
    }

    fn sandbox_spec(&self, run: &Run, image: &str, entrypoint: Option<String>) -> SandboxSpec {
        let container_workdir = self.config.container_workdir();
        let mounts = if self.config.bind_workdir {
            vec![Mount {
                host: self.config.workdir.to_string_lossy().to_string(),
                container: container_workdir.clone(),
            }]
        } else {
            vec![]
        };

        SandboxSpec {
            name: format!(
                "local-actions-{}-{}",
                sanitize(&run.job_id),
                &uuid::Uuid::new_v4().simple().to_string()[..8]
            ),
            image: image.to_string(),
            architecture: self.config.container_architecture.clone(),
            mounts,
            workdir: Some(container_workdir),
            entrypoint,
        }
    }

    /// Environment injected for one step execution: run env under the step
    /// overlay, plus secrets. Secrets stay sandbox-local and never reach
    /// results or logs.
    fn step_env(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        let mut env = ctx.env.clone();
        env.extend(evaluate_env(&step.env, ctx)?);
        env.extend(self.config.secrets.clone());
        Ok(env)
    }

    /// `with:` values over declared input defaults, exposed as INPUT_* vars
    fn inputs_env(
        &self,
        step: &Step,
        inputs: &HashMap<String, ActionInput>,
        ctx: &ExecutionContext,
    ) -> Result<HashMap<String, String>, ExecutorError> {
        let mut env = HashMap::new();

        for (name, input) in inputs {
            if let Some(default) = &input.default {
                env.insert(
                    input_env_name(name),
                    evaluate(&value_to_string(default), ctx)?,
                );
            }
        }
        for (name, value) in evaluate_params(&step.with, ctx)? {
            env.insert(input_env_name(&name), value);
        }

        Ok(env)
    }

    fn step_workdir(&self, run: &Run, step: &Step) -> String {
        let base = self.config.container_workdir();
        let relative = step
            .working_directory
            .as_deref()
            .or_else(|| run.job().working_directory(&run.workflow));

        match relative {
            Some(dir) if dir.starts_with('/') => dir.to_string(),
            Some(dir) => format!("{}/{}", base.trim_end_matches('/'), dir),
            None => base,
        }
    }
}

/// Race a sandbox operation against cancellation; in-flight work is asked to
/// stop by dropping it.
async fn exec_cancellable<T>(
    cancel: &CancellationToken,
    operation: impl std::future::Future<Output = Result<T, SandboxError>>,
) -> Result<T, ExecutorError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
        result = operation => result.map_err(ExecutorError::from),
    }
}

/// Build the argv for a `run` script under the given shell
fn shell_command(shell: &str, script: &str) -> Vec<String> {
    match shell {
        "bash" => vec![
            "bash".to_string(),
            "--noprofile".to_string(),
            "--norc".to_string(),
            "-e".to_string(),
            "-o".to_string(),
            "pipefail".to_string(),
            "-c".to_string(),
            script.to_string(),
        ],
        "sh" => vec![
            "sh".to_string(),
            "-e".to_string(),
            "-c".to_string(),
            script.to_string(),
        ],
        "python" => vec!["python".to_string(), "-c".to_string(), script.to_string()],
        custom if custom.contains("{0}") => custom
            .split_whitespace()
            .map(|part| {
                if part == "{0}" {
                    script.to_string()
                } else {
                    part.to_string()
                }
            })
            .collect(),
        other => vec![other.to_string(), "-c".to_string(), script.to_string()],
    }
}

fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.to_uppercase().replace([' ', '-'], "_"))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
