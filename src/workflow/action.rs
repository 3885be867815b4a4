//! Action references and resolution
//!
//! Parses `uses:` references and resolves them to something the executor can
//! dispatch: a container image, a script run by a language runtime already in
//! the sandbox, or a composite sequence of nested steps. Local references are
//! read from the filesystem; remote references are fetched with a shallow
//! `git` clone into a per-reference cache directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tracing::debug;

use super::job::Step;

/// A parsed `uses:` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsesRef {
    /// `docker://image:tag`
    Docker { image: String },
    /// `./path/to/action` relative to the working directory
    Local { path: String },
    /// `owner/repo[/sub/dir]@ref`
    Remote {
        owner: String,
        repo: String,
        path: Option<String>,
        git_ref: String,
    },
}

impl UsesRef {
    /// Parse a `uses:` string into a reference
    pub fn parse(uses: &str) -> Result<Self, String> {
        if let Some(image) = uses.strip_prefix("docker://") {
            if image.is_empty() {
                return Err(format!("invalid docker reference: {}", uses));
            }
            return Ok(UsesRef::Docker {
                image: image.to_string(),
            });
        }

        if uses.starts_with("./") || uses.starts_with("../") {
            return Ok(UsesRef::Local {
                path: uses.to_string(),
            });
        }

        let (location, git_ref) = uses
            .split_once('@')
            .ok_or_else(|| format!("remote action reference '{}' is missing '@ref'", uses))?;

        let mut segments = location.splitn(3, '/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(repo), path) if !owner.is_empty() && !repo.is_empty() => {
                Ok(UsesRef::Remote {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    path: path.map(String::from),
                    git_ref: git_ref.to_string(),
                })
            }
            _ => Err(format!("cannot parse action reference: {}", uses)),
        }
    }

    /// Repository clone URL for remote references
    pub fn clone_url(&self) -> Option<String> {
        match self {
            UsesRef::Remote { owner, repo, .. } => {
                Some(format!("https://github.com/{}/{}", owner, repo))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for UsesRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsesRef::Docker { image } => write!(f, "docker://{}", image),
            UsesRef::Local { path } => write!(f, "{}", path),
            UsesRef::Remote {
                owner,
                repo,
                path,
                git_ref,
            } => match path {
                Some(sub) => write!(f, "{}/{}/{}@{}", owner, repo, sub, git_ref),
                None => write!(f, "{}/{}@{}", owner, repo, git_ref),
            },
        }
    }
}

// ============================================================================
// Action manifests (action.yml)
// ============================================================================

/// Parsed `action.yml` manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionManifest {
    pub name: Option<String>,

    #[serde(default)]
    pub inputs: HashMap<String, ActionInput>,

    pub runs: ActionRuns,
}

/// One declared action input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionInput {
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    pub default: Option<serde_yaml::Value>,
}

/// The `runs:` section of a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRuns {
    pub using: String,

    /// Container actions: image reference
    pub image: Option<String>,

    /// Container actions: entrypoint override
    pub entrypoint: Option<String>,

    /// Container actions: arguments passed to the entrypoint
    #[serde(default)]
    pub args: Vec<String>,

    /// Script actions: entry file relative to the action directory
    pub main: Option<String>,

    /// Composite actions: nested steps
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An action resolved to one of the executable kinds
#[derive(Debug, Clone)]
pub enum ResolvedAction {
    /// Runs as its own container from `image`
    Container {
        image: String,
        entrypoint: Option<String>,
        args: Vec<String>,
        inputs: HashMap<String, ActionInput>,
    },
    /// Runs inside the job sandbox through a language runtime
    Script {
        runtime: String,
        /// Action directory on the host
        dir: PathBuf,
        /// Entry file relative to `dir`
        main: String,
        inputs: HashMap<String, ActionInput>,
    },
    /// Expands into nested steps sharing the parent run's environment
    Composite {
        steps: Vec<Step>,
        inputs: HashMap<String, ActionInput>,
    },
}

/// Errors raised while resolving an action reference
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("action '{reference}' has no manifest at {path}")]
    MissingManifest { reference: String, path: String },

    #[error("cannot read action manifest {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("action manifest {path} is malformed: {error}")]
    Yaml {
        path: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("action '{reference}' uses unsupported runtime '{using}'")]
    UnsupportedRuntime { reference: String, using: String },

    #[error("action '{reference}' builds from a Dockerfile, which needs the image build layer")]
    DockerfileImage { reference: String },

    #[error("failed to fetch action '{reference}': {message}")]
    Fetch { reference: String, message: String },
}

/// Resolves action references to executable actions
#[async_trait::async_trait]
pub trait ActionResolver: Send + Sync {
    async fn resolve(&self, reference: &UsesRef) -> Result<ResolvedAction, ResolveError>;
}

/// Filesystem-backed resolver: local paths under the working directory,
/// remote references cached under `cache_dir` via `git`.
pub struct FsActionResolver {
    workdir: PathBuf,
    cache_dir: PathBuf,
    git: Option<PathBuf>,
}

impl FsActionResolver {
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        let cache_dir = std::env::temp_dir().join("local-actions-cache");
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            cache_dir,
            git: which::which("git").ok(),
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl AsRef<Path>) -> Self {
        self.cache_dir = cache_dir.as_ref().to_path_buf();
        self
    }

    /// Cache directory for one remote reference, keyed by a digest of the
    /// full reference so refs with path separators stay flat on disk.
    fn checkout_dir(&self, reference: &UsesRef) -> PathBuf {
        let digest = Sha256::digest(reference.to_string().as_bytes());
        self.cache_dir.join(hex::encode(&digest[..16]))
    }

    async fn fetch_remote(&self, reference: &UsesRef) -> Result<PathBuf, ResolveError> {
        let UsesRef::Remote { path, git_ref, .. } = reference else {
            return Err(ResolveError::Fetch {
                reference: reference.to_string(),
                message: "not a remote reference".to_string(),
            });
        };

        let checkout = self.checkout_dir(reference);
        let action_dir = match path {
            Some(sub) => checkout.join(sub),
            None => checkout.clone(),
        };

        if action_dir.is_dir() {
            debug!("Using cached action checkout: {}", checkout.display());
            return Ok(action_dir);
        }

        let git = self.git.as_ref().ok_or_else(|| ResolveError::Fetch {
            reference: reference.to_string(),
            message: "git binary not found".to_string(),
        })?;

        let url = reference.clone_url().ok_or_else(|| ResolveError::Fetch {
            reference: reference.to_string(),
            message: "reference has no clone URL".to_string(),
        })?;

        debug!("Fetching action {} from {}", reference, url);
        let output = Command::new(git)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--branch")
            .arg(git_ref)
            .arg(&url)
            .arg(&checkout)
            .output()
            .await
            .map_err(|e| ResolveError::Fetch {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ResolveError::Fetch {
                reference: reference.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(action_dir)
    }

    fn load_manifest(
        &self,
        reference: &UsesRef,
        dir: &Path,
    ) -> Result<ResolvedAction, ResolveError> {
        let manifest_path = ["action.yml", "action.yaml"]
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| ResolveError::MissingManifest {
                reference: reference.to_string(),
                path: dir.display().to_string(),
            })?;

        let content =
            std::fs::read_to_string(&manifest_path).map_err(|error| ResolveError::Io {
                path: manifest_path.display().to_string(),
                error,
            })?;
        let manifest: ActionManifest =
            serde_yaml::from_str(&content).map_err(|error| ResolveError::Yaml {
                path: manifest_path.display().to_string(),
                error,
            })?;

        resolve_manifest(reference, dir, manifest)
    }
}

fn resolve_manifest(
    reference: &UsesRef,
    dir: &Path,
    manifest: ActionManifest,
) -> Result<ResolvedAction, ResolveError> {
    let using = manifest.runs.using.as_str();

    if using == "docker" {
        let image = manifest.runs.image.clone().unwrap_or_default();
        if image == "Dockerfile" || image.ends_with("/Dockerfile") {
            return Err(ResolveError::DockerfileImage {
                reference: reference.to_string(),
            });
        }
        let image = image.strip_prefix("docker://").unwrap_or(&image).to_string();
        return Ok(ResolvedAction::Container {
            image,
            entrypoint: manifest.runs.entrypoint,
            args: manifest.runs.args,
            inputs: manifest.inputs,
        });
    }

    if using.starts_with("node") {
        let main = manifest
            .runs
            .main
            .clone()
            .ok_or_else(|| ResolveError::UnsupportedRuntime {
                reference: reference.to_string(),
                using: format!("{} without a main entry", using),
            })?;
        return Ok(ResolvedAction::Script {
            runtime: "node".to_string(),
            dir: dir.to_path_buf(),
            main,
            inputs: manifest.inputs,
        });
    }

    if using == "composite" {
        return Ok(ResolvedAction::Composite {
            steps: manifest.runs.steps,
            inputs: manifest.inputs,
        });
    }

    Err(ResolveError::UnsupportedRuntime {
        reference: reference.to_string(),
        using: using.to_string(),
    })
}

#[async_trait::async_trait]
impl ActionResolver for FsActionResolver {
    async fn resolve(&self, reference: &UsesRef) -> Result<ResolvedAction, ResolveError> {
        match reference {
            UsesRef::Docker { image } => Ok(ResolvedAction::Container {
                image: image.clone(),
                entrypoint: None,
                args: vec![],
                inputs: HashMap::new(),
            }),
            UsesRef::Local { path } => {
                let dir = self.workdir.join(path);
                self.load_manifest(reference, &dir)
            }
            UsesRef::Remote { .. } => {
                let dir = self.fetch_remote(reference).await?;
                self.load_manifest(reference, &dir)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docker_reference() {
        let parsed = UsesRef::parse("docker://alpine:3.18").unwrap();
        assert_eq!(
            parsed,
            UsesRef::Docker {
                image: "alpine:3.18".to_string()
            }
        );
    }

    #[test]
    fn test_parse_local_reference() {
        let parsed = UsesRef::parse("./actions/setup").unwrap();
        assert_eq!(
            parsed,
            UsesRef::Local {
                path: "./actions/setup".to_string()
            }
        );
    }

    #[test]
    fn test_parse_remote_reference() {
        let parsed = UsesRef::parse("actions/checkout@v4").unwrap();
        assert_eq!(
            parsed,
            UsesRef::Remote {
                owner: "actions".to_string(),
                repo: "checkout".to_string(),
                path: None,
                git_ref: "v4".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_remote_reference_with_subdir() {
        let parsed = UsesRef::parse("octo/toolkit/packages/core@main").unwrap();
        assert_eq!(
            parsed,
            UsesRef::Remote {
                owner: "octo".to_string(),
                repo: "toolkit".to_string(),
                path: Some("packages/core".to_string()),
                git_ref: "main".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_invalid_references() {
        assert!(UsesRef::parse("actions/checkout").is_err());
        assert!(UsesRef::parse("docker://").is_err());
        assert!(UsesRef::parse("/lonely@ref").is_err());
    }

    #[tokio::test]
    async fn test_resolve_local_container_action() {
        let dir = tempfile::tempdir().unwrap();
        let action_dir = dir.path().join("my-action");
        std::fs::create_dir(&action_dir).unwrap();
        std::fs::write(
            action_dir.join("action.yml"),
            r#"
name: greet
inputs:
  who:
    default: world
runs:
  using: docker
  image: docker://alpine:3.18
  args: ["echo", "hello"]
"#,
        )
        .unwrap();

        let resolver = FsActionResolver::new(dir.path());
        let resolved = resolver
            .resolve(&UsesRef::parse("./my-action").unwrap())
            .await
            .unwrap();

        match resolved {
            ResolvedAction::Container { image, args, inputs, .. } => {
                assert_eq!(image, "alpine:3.18");
                assert_eq!(args, vec!["echo", "hello"]);
                assert!(inputs.contains_key("who"));
            }
            other => panic!("expected container action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_local_composite_action() {
        let dir = tempfile::tempdir().unwrap();
        let action_dir = dir.path().join("combo");
        std::fs::create_dir(&action_dir).unwrap();
        std::fs::write(
            action_dir.join("action.yaml"),
            r#"
name: combo
runs:
  using: composite
  steps:
    - run: echo one
    - run: echo two
"#,
        )
        .unwrap();

        let resolver = FsActionResolver::new(dir.path());
        let resolved = resolver
            .resolve(&UsesRef::parse("./combo").unwrap())
            .await
            .unwrap();

        match resolved {
            ResolvedAction::Composite { steps, .. } => assert_eq!(steps.len(), 2),
            other => panic!("expected composite action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FsActionResolver::new(dir.path());
        let result = resolver
            .resolve(&UsesRef::parse("./not-there").unwrap())
            .await;
        assert!(matches!(
            result,
            Err(ResolveError::MissingManifest { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_dockerfile_action_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let action_dir = dir.path().join("built");
        std::fs::create_dir(&action_dir).unwrap();
        std::fs::write(
            action_dir.join("action.yml"),
            "runs:\n  using: docker\n  image: Dockerfile\n",
        )
        .unwrap();

        let resolver = FsActionResolver::new(dir.path());
        let result = resolver.resolve(&UsesRef::parse("./built").unwrap()).await;
        assert!(matches!(result, Err(ResolveError::DockerfileImage { .. })));
    }
}
