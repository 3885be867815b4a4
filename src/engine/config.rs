//! Runner configuration
//!
//! Immutable description of one engine invocation: the triggering event, the
//! working directory and how it enters sandboxes, runner-label bindings,
//! secrets, environment, and container policy. Constructed once at startup
//! and shared read-only by every concurrently executing run.

use std::collections::HashMap;
use std::path::PathBuf;

use super::paths::container_path;

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Host working directory entering job sandboxes
    pub workdir: PathBuf,

    /// Bind-mount the working directory instead of copying it in
    pub bind_workdir: bool,

    /// Name of the triggering event
    pub event_name: String,

    /// Optional path to a JSON event payload document
    pub event_path: Option<PathBuf>,

    /// Runner-label to container-image bindings
    pub platforms: HashMap<String, String>,

    /// Keep job sandboxes keyed for reuse within this invocation
    pub reuse_sandboxes: bool,

    /// Force an OS/CPU architecture for every container (e.g. "linux/arm64")
    pub container_architecture: Option<String>,

    /// Secret values injected into sandboxes; never logged
    pub secrets: HashMap<String, String>,

    /// Environment applied under workflow/job/step overlays
    pub env: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("working directory is not set")]
    MissingWorkdir,

    #[error("cannot resolve working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("cannot read event payload {path}: {error}")]
    EventPayloadIo {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("event payload {path} is not valid JSON: {error}")]
    EventPayloadJson {
        path: String,
        #[source]
        error: serde_json::Error,
    },
}

impl RunnerConfig {
    /// Check invariants that later translation and execution rely on.
    /// A relative workdir needs a resolvable current directory now, so path
    /// translation never fails mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workdir.as_os_str().is_empty() {
            return Err(ConfigError::MissingWorkdir);
        }

        if self.workdir.is_relative() {
            std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
        }

        Ok(())
    }

    /// The working directory as seen from inside a sandbox
    pub fn container_workdir(&self) -> String {
        container_path(&self.workdir.to_string_lossy())
    }

    /// Image bound to a runner label
    pub fn image_for(&self, label: &str) -> Option<&str> {
        self.platforms.get(label).map(|s| s.as_str())
    }

    /// Load the event payload document, when one is configured
    pub fn load_event_payload(&self) -> Result<Option<serde_json::Value>, ConfigError> {
        let Some(path) = &self.event_path else {
            return Ok(None);
        };

        let content =
            std::fs::read_to_string(path).map_err(|error| ConfigError::EventPayloadIo {
                path: path.display().to_string(),
                error,
            })?;
        let payload =
            serde_json::from_str(&content).map_err(|error| ConfigError::EventPayloadJson {
                path: path.display().to_string(),
                error,
            })?;

        Ok(Some(payload))
    }
}
