//! Workflow loader
//!
//! Load workflow YAML files from a single file or a directory.

use std::path::Path;

use super::Workflow;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },
}

pub struct WorkflowLoader;

impl WorkflowLoader {
    /// Load every `.yml`/`.yaml` workflow in a directory, sorted by file name
    pub fn load_directory(dir: &Path) -> Result<Vec<Workflow>, LoadError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
            })
            .collect();
        paths.sort();

        paths
            .into_iter()
            .map(|path| Self::load_file(&path))
            .collect()
    }

    pub fn load_file(path: &Path) -> Result<Workflow, LoadError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }
}
