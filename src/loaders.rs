use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

pub(crate) const CONFIG_FILE: &str = "config.json";
pub(crate) const WEIGHTS_FILE: &str = "model.safetensors";

/// Where a model artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactSource {
    /// A directory on local disk holding `config.json` and `model.safetensors`.
    Local(PathBuf),
    /// A Hugging Face Hub model repo, resolved through the local hub cache.
    Hub(String),
}

impl ArtifactSource {
    /// Artifact directory on local disk.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        ArtifactSource::Local(dir.into())
    }

    /// Artifact stored in a Hub model repo.
    pub fn hub(repo: impl Into<String>) -> Self {
        ArtifactSource::Hub(repo.into())
    }

    pub(crate) fn cache_key(&self) -> String {
        match self {
            ArtifactSource::Local(dir) => format!("local:{}", dir.display()),
            ArtifactSource::Hub(repo) => format!("hub:{repo}"),
        }
    }

    pub(crate) fn resolve(&self, filename: &str) -> Result<PathBuf> {
        match self {
            ArtifactSource::Local(dir) => {
                let path = dir.join(filename);
                if !path.is_file() {
                    return Err(PipelineError::ModelLoad(format!(
                        "Model artifact '{}' not found",
                        path.display()
                    )));
                }
                Ok(path)
            }
            ArtifactSource::Hub(repo) => HfLoader::new(repo, filename).load(),
        }
    }
}

impl From<PathBuf> for ArtifactSource {
    fn from(value: PathBuf) -> Self {
        ArtifactSource::Local(value)
    }
}

impl From<&Path> for ArtifactSource {
    fn from(value: &Path) -> Self {
        ArtifactSource::Local(value.to_path_buf())
    }
}

impl From<&str> for ArtifactSource {
    fn from(value: &str) -> Self {
        ArtifactSource::Local(PathBuf::from(value))
    }
}

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let hf_api = hf_hub::api::sync::ApiBuilder::new()
            .with_progress(false)
            .build()
            .map_err(|e| {
                PipelineError::Download(format!("Failed to initialize HuggingFace API: {e}"))
            })?;

        hf_api
            .model(self.repo.clone())
            .get(&self.filename)
            .map_err(|e| {
                PipelineError::Download(format!(
                    "Failed to download '{}' from '{}': {}",
                    self.filename, self.repo, e
                ))
            })
    }
}

/// Reads and parses the `config.json` of an artifact.
pub(crate) fn load_config<C: DeserializeOwned>(source: &ArtifactSource) -> Result<C> {
    let path = source.resolve(CONFIG_FILE)?;
    let content = std::fs::read_to_string(&path).map_err(|e| {
        PipelineError::ModelLoad(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        PipelineError::ModelLoad(format!("Invalid config '{}': {}", path.display(), e))
    })
}
