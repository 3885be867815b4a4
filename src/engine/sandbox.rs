//! Sandbox provisioning
//!
//! Container-backed execution environments, behind runtime traits so the
//! engine stays independent of the container backend. `DockerCli` drives the
//! docker binary; `SandboxPool` keeps reusable sandboxes keyed by
//! (job, image, architecture) with per-key create-or-fetch exclusion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A bind mount from host into sandbox
#[derive(Debug, Clone)]
pub struct Mount {
    pub host: String,
    pub container: String,
}

/// Everything a runtime needs to provision one sandbox
#[derive(Debug, Clone, Default)]
pub struct SandboxSpec {
    pub name: String,
    pub image: String,
    /// OS/CPU architecture to emulate, e.g. "linux/arm64"
    pub architecture: Option<String>,
    pub mounts: Vec<Mount>,
    pub workdir: Option<String>,
    /// Entrypoint override for one-shot action containers
    pub entrypoint: Option<String>,
}

/// Captured output of a process run inside a sandbox
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("failed to provision sandbox from image '{image}': {message}")]
    Provision { image: String, message: String },

    #[error("failed to execute command in sandbox '{id}': {message}")]
    Exec { id: String, message: String },

    #[error("failed to copy '{src}' into sandbox: {message}")]
    Copy { src: String, message: String },

    #[error("failed to remove sandbox '{id}': {message}")]
    Remove { id: String, message: String },
}

/// A provisioned, long-lived execution environment
#[async_trait]
pub trait Sandbox: Send + Sync {
    fn id(&self) -> &str;

    /// Run a command to completion, capturing its output. `env` is injected
    /// for this execution only.
    async fn exec(
        &self,
        command: &[String],
        env: &HashMap<String, String>,
        workdir: Option<&str>,
    ) -> Result<ExecOutput, SandboxError>;

    /// Copy a host directory into the sandbox
    async fn copy_into(&self, source: &Path, dest: &str) -> Result<(), SandboxError>;

    async fn remove(&self) -> Result<(), SandboxError>;
}

/// Provisions sandboxes; implemented by the docker driver and by test mocks
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Provision a long-lived sandbox that accepts repeated exec calls
    async fn create(&self, spec: &SandboxSpec) -> Result<Arc<dyn Sandbox>, SandboxError>;

    /// Run a container action once, honouring the image entrypoint, and
    /// remove it afterwards
    async fn run_once(
        &self,
        spec: &SandboxSpec,
        env: &HashMap<String, String>,
        args: &[String],
    ) -> Result<ExecOutput, SandboxError>;
}

// ============================================================================
// Docker CLI driver
// ============================================================================

/// Container runtime backed by the docker binary
pub struct DockerCli {
    binary: PathBuf,
}

impl DockerCli {
    pub fn new() -> Result<Self, SandboxError> {
        let binary = which::which("docker")
            .map_err(|e| SandboxError::RuntimeUnavailable(e.to_string()))?;
        Ok(Self { binary })
    }

    fn base_args(spec: &SandboxSpec) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(architecture) = &spec.architecture {
            args.push("--platform".to_string());
            args.push(architecture.clone());
        }
        for mount in &spec.mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}", mount.host, mount.container));
        }
        if let Some(workdir) = &spec.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        if let Some(entrypoint) = &spec.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }
        args
    }
}

async fn run_binary(binary: &Path, args: &[String]) -> Result<ExecOutput, SandboxError> {
    debug!("docker {}", args.join(" "));

    let output = Command::new(binary)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| SandboxError::RuntimeUnavailable(e.to_string()))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn create(&self, spec: &SandboxSpec) -> Result<Arc<dyn Sandbox>, SandboxError> {
        info!("Provisioning sandbox '{}' from {}", spec.name, spec.image);

        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            spec.name.clone(),
        ];
        args.extend(Self::base_args(spec));
        args.push(spec.image.clone());
        // Keep the container alive between step execs.
        args.extend(["tail", "-f", "/dev/null"].map(String::from));

        let output = run_binary(&self.binary, &args).await?;
        if !output.success() {
            return Err(SandboxError::Provision {
                image: spec.image.clone(),
                message: output.stderr.trim().to_string(),
            });
        }

        Ok(Arc::new(DockerSandbox {
            binary: self.binary.clone(),
            id: spec.name.clone(),
        }))
    }

    async fn run_once(
        &self,
        spec: &SandboxSpec,
        env: &HashMap<String, String>,
        args: &[String],
    ) -> Result<ExecOutput, SandboxError> {
        info!("Running action container from {}", spec.image);

        let mut docker_args = vec!["run".to_string(), "--rm".to_string()];
        docker_args.extend(Self::base_args(spec));
        for (key, value) in env {
            docker_args.push("-e".to_string());
            docker_args.push(format!("{}={}", key, value));
        }
        docker_args.push(spec.image.clone());
        docker_args.extend(args.iter().cloned());

        run_binary(&self.binary, &docker_args).await
    }
}

struct DockerSandbox {
    binary: PathBuf,
    id: String,
}

#[async_trait]
impl Sandbox for DockerSandbox {
    fn id(&self) -> &str {
        &self.id
    }

    async fn exec(
        &self,
        command: &[String],
        env: &HashMap<String, String>,
        workdir: Option<&str>,
    ) -> Result<ExecOutput, SandboxError> {
        let mut args = vec!["exec".to_string()];
        if let Some(workdir) = workdir {
            args.push("-w".to_string());
            args.push(workdir.to_string());
        }
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(self.id.clone());
        args.extend(command.iter().cloned());

        run_binary(&self.binary, &args)
            .await
            .map_err(|e| SandboxError::Exec {
                id: self.id.clone(),
                message: e.to_string(),
            })
    }

    async fn copy_into(&self, source: &Path, dest: &str) -> Result<(), SandboxError> {
        // `src/.` copies directory contents rather than the directory itself.
        let args = vec![
            "cp".to_string(),
            format!("{}/.", source.display()),
            format!("{}:{}", self.id, dest),
        ];

        let output = run_binary(&self.binary, &args).await?;
        if !output.success() {
            return Err(SandboxError::Copy {
                src: source.display().to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    async fn remove(&self) -> Result<(), SandboxError> {
        let args = vec!["rm".to_string(), "-f".to_string(), self.id.clone()];
        let output = run_binary(&self.binary, &args).await?;
        if !output.success() {
            return Err(SandboxError::Remove {
                id: self.id.clone(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Reuse pool
// ============================================================================

/// Key identifying a reusable sandbox
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub job_id: String,
    pub image: String,
    pub architecture: Option<String>,
}

type PoolSlot = Arc<Mutex<Option<Arc<dyn Sandbox>>>>;

/// Registry of reusable sandboxes. The outer lock only guards slot lookup;
/// provisioning serializes per key on the slot lock, so distinct keys
/// provision concurrently and no key is provisioned twice.
#[derive(Default)]
pub struct SandboxPool {
    slots: Mutex<HashMap<PoolKey, PoolSlot>>,
}

impl SandboxPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the pooled sandbox for `key`, provisioning it on first use
    pub async fn get_or_create<F, Fut>(
        &self,
        key: PoolKey,
        provision: F,
    ) -> Result<Arc<dyn Sandbox>, SandboxError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Arc<dyn Sandbox>, SandboxError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(key).or_default().clone()
        };

        let mut guard = slot.lock().await;
        if let Some(sandbox) = guard.as_ref() {
            debug!("Reusing pooled sandbox '{}'", sandbox.id());
            return Ok(sandbox.clone());
        }

        let sandbox = provision().await?;
        *guard = Some(sandbox.clone());
        Ok(sandbox)
    }

    /// Remove every pooled sandbox
    pub async fn teardown(&self) {
        let slots: Vec<PoolSlot> = {
            let mut map = self.slots.lock().await;
            map.drain().map(|(_, slot)| slot).collect()
        };

        for slot in slots {
            let sandbox = slot.lock().await.take();
            if let Some(sandbox) = sandbox {
                if let Err(e) = sandbox.remove().await {
                    warn!("Failed to remove pooled sandbox: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullSandbox {
        id: String,
    }

    #[async_trait]
    impl Sandbox for NullSandbox {
        fn id(&self) -> &str {
            &self.id
        }

        async fn exec(
            &self,
            _command: &[String],
            _env: &HashMap<String, String>,
            _workdir: Option<&str>,
        ) -> Result<ExecOutput, SandboxError> {
            Ok(ExecOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }

        async fn copy_into(&self, _source: &Path, _dest: &str) -> Result<(), SandboxError> {
            Ok(())
        }

        async fn remove(&self) -> Result<(), SandboxError> {
            Ok(())
        }
    }

    fn key(job_id: &str) -> PoolKey {
        PoolKey {
            job_id: job_id.to_string(),
            image: "img".to_string(),
            architecture: None,
        }
    }

    #[tokio::test]
    async fn test_pool_provisions_once_per_key() {
        let pool = SandboxPool::new();
        let provisioned = AtomicUsize::new(0);

        for _ in 0..3 {
            let sandbox = pool
                .get_or_create(key("build"), || async {
                    let n = provisioned.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(NullSandbox {
                        id: format!("sb-{}", n),
                    }) as Arc<dyn Sandbox>)
                })
                .await
                .unwrap();
            assert_eq!(sandbox.id(), "sb-0");
        }

        assert_eq!(provisioned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pool_distinct_keys_get_distinct_sandboxes() {
        let pool = SandboxPool::new();

        let a = pool
            .get_or_create(key("a"), || async {
                Ok(Arc::new(NullSandbox { id: "a".into() }) as Arc<dyn Sandbox>)
            })
            .await
            .unwrap();
        let b = pool
            .get_or_create(key("b"), || async {
                Ok(Arc::new(NullSandbox { id: "b".into() }) as Arc<dyn Sandbox>)
            })
            .await
            .unwrap();

        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_pool_failed_provision_retries_on_next_fetch() {
        let pool = SandboxPool::new();

        let result = pool
            .get_or_create(key("flaky"), || async {
                Err(SandboxError::Provision {
                    image: "img".to_string(),
                    message: "boom".to_string(),
                })
            })
            .await;
        assert!(result.is_err());

        let sandbox = pool
            .get_or_create(key("flaky"), || async {
                Ok(Arc::new(NullSandbox { id: "ok".into() }) as Arc<dyn Sandbox>)
            })
            .await
            .unwrap();
        assert_eq!(sandbox.id(), "ok");
    }

    #[tokio::test]
    async fn test_teardown_drains_pool() {
        let pool = SandboxPool::new();
        pool.get_or_create(key("x"), || async {
            Ok(Arc::new(NullSandbox { id: "x".into() }) as Arc<dyn Sandbox>)
        })
        .await
        .unwrap();

        pool.teardown().await;
        assert!(pool.slots.lock().await.is_empty());
    }
}
