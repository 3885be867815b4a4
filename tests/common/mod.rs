use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use local_actions::engine::sandbox::{
    ContainerRuntime, ExecOutput, Sandbox, SandboxError, SandboxSpec,
};
use local_actions::engine::{ExecutionObserver, RunnerConfig, StepStatus};

pub fn test_config() -> RunnerConfig {
    RunnerConfig {
        workdir: PathBuf::from("/work/project"),
        event_name: "push".to_string(),
        platforms: [(
            "ubuntu-latest".to_string(),
            "node:16-buster-slim".to_string(),
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    }
}

/// One recorded exec call against a mock sandbox
#[derive(Debug, Clone)]
pub struct ExecCall {
    pub sandbox: String,
    pub command: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<String>,
}

impl ExecCall {
    /// The script payload of a shell invocation (the last argv element)
    pub fn script(&self) -> &str {
        self.command.last().map(|s| s.as_str()).unwrap_or("")
    }
}

/// Everything the mock runtime records, shared with its sandboxes
#[derive(Default)]
pub struct MockState {
    pub created: Mutex<Vec<SandboxSpec>>,
    pub one_shots: Mutex<Vec<(SandboxSpec, HashMap<String, String>, Vec<String>)>>,
    pub execs: Mutex<Vec<ExecCall>>,
    pub removed: Mutex<Vec<String>>,
    pub copied: Mutex<Vec<(PathBuf, String)>>,
}

/// In-memory container runtime for executor tests.
///
/// Behavior is driven by the script text: a line containing `exit 1` fails
/// with that exit code, and `echo <text>` lines appear on stdout, which lets
/// tests emit workflow commands like `::set-output`.
#[derive(Default)]
pub struct MockRuntime {
    pub state: Arc<MockState>,
}

impl MockRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn exec_scripts(&self) -> Vec<String> {
        self.state
            .execs
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.script().to_string())
            .collect()
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.state.execs.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.state.created.lock().unwrap().len()
    }

    pub fn removed_count(&self) -> usize {
        self.state.removed.lock().unwrap().len()
    }
}

fn interpret(script: &str) -> ExecOutput {
    let mut stdout = String::new();

    for line in script.lines() {
        let line = line.trim();
        if let Some(payload) = line.strip_prefix("echo ") {
            stdout.push_str(payload.trim_matches('"'));
            stdout.push('\n');
        }
        if line.contains("exit 1") {
            return ExecOutput {
                exit_code: 1,
                stdout,
                stderr: "command failed".to_string(),
            };
        }
    }

    ExecOutput {
        exit_code: 0,
        stdout,
        stderr: String::new(),
    }
}

pub struct MockSandbox {
    state: Arc<MockState>,
    id: String,
}

#[async_trait]
impl Sandbox for MockSandbox {
    fn id(&self) -> &str {
        &self.id
    }

    async fn exec(
        &self,
        command: &[String],
        env: &HashMap<String, String>,
        workdir: Option<&str>,
    ) -> Result<ExecOutput, SandboxError> {
        let call = ExecCall {
            sandbox: self.id.clone(),
            command: command.to_vec(),
            env: env.clone(),
            workdir: workdir.map(String::from),
        };
        let script = call.script().to_string();
        self.state.execs.lock().unwrap().push(call);
        Ok(interpret(&script))
    }

    async fn copy_into(&self, source: &Path, dest: &str) -> Result<(), SandboxError> {
        self.state
            .copied
            .lock()
            .unwrap()
            .push((source.to_path_buf(), dest.to_string()));
        Ok(())
    }

    async fn remove(&self) -> Result<(), SandboxError> {
        self.state.removed.lock().unwrap().push(self.id.clone());
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create(&self, spec: &SandboxSpec) -> Result<Arc<dyn Sandbox>, SandboxError> {
        self.state.created.lock().unwrap().push(spec.clone());
        Ok(Arc::new(MockSandbox {
            state: self.state.clone(),
            id: spec.name.clone(),
        }))
    }

    async fn run_once(
        &self,
        spec: &SandboxSpec,
        env: &HashMap<String, String>,
        args: &[String],
    ) -> Result<ExecOutput, SandboxError> {
        self.state
            .one_shots
            .lock()
            .unwrap()
            .push((spec.clone(), env.clone(), args.to_vec()));
        Ok(ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Observer that records events for assertions
#[derive(Default)]
pub struct RecordingObserver {
    pub output_lines: Mutex<Vec<String>>,
    pub finished_steps: Mutex<Vec<(String, String, StepStatus)>>,
    pub started_runs: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_run_started(&self, run_name: &str) {
        self.started_runs
            .lock()
            .unwrap()
            .push(run_name.to_string());
    }

    fn on_step_finished(&self, run_name: &str, step_name: &str, status: StepStatus) {
        self.finished_steps.lock().unwrap().push((
            run_name.to_string(),
            step_name.to_string(),
            status,
        ));
    }

    fn on_step_output(&self, _run_name: &str, line: &str) {
        self.output_lines.lock().unwrap().push(line.to_string());
    }
}
