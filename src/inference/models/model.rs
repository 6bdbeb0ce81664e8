use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::{Deserialize, Serialize};

/// Network layout the weights file was trained with.
#[derive(ValueEnum, Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Mlp,
    #[default]
    #[value(name = "convnet")]
    ConvNet,
}

impl Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::Mlp => write!(f, "mlp"),
            Architecture::ConvNet => write!(f, "convnet"),
        }
    }
}

/// Where the safetensors weights are read from.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    Local(PathBuf),
    Hub {
        /// The id of the model repository
        repo_id: String,
        /// The revision of the model repository
        repo_revision: String,
        /// The weights file inside the repository
        filename: String,
    },
}

impl WeightSource {
    /// Picks the hub when a repository is configured, the local filesystem otherwise.
    pub fn new(model_path: &str, model_repo: &str, model_revision: &str) -> Self {
        if model_repo.is_empty() {
            WeightSource::Local(PathBuf::from(model_path))
        } else {
            WeightSource::Hub {
                repo_id: model_repo.to_string(),
                repo_revision: model_revision.to_string(),
                filename: model_path.to_string(),
            }
        }
    }

    /// Resolves the weights to a local file, downloading them into the hub cache if needed.
    #[tracing::instrument(level = "info")]
    pub fn fetch(&self) -> Result<PathBuf> {
        match self {
            WeightSource::Local(path) => Ok(path.clone()),
            WeightSource::Hub {
                repo_id,
                repo_revision,
                filename,
            } => {
                let repo = Api::new()?.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    repo_revision.clone(),
                ));
                Ok(repo.get(filename)?)
            }
        }
    }
}

impl Display for WeightSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightSource::Local(path) => write!(f, "{}", path.display()),
            WeightSource::Hub {
                repo_id,
                repo_revision,
                filename,
            } => write!(f, "hf://{repo_id}@{repo_revision}/{filename}"),
        }
    }
}
