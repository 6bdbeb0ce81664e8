use anyhow::Result;
use clap_serde_derive::ClapSerde;
use serde::Deserialize;

use crate::inference::models::model::{Architecture, WeightSource};

#[derive(ClapSerde, Deserialize, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub(crate) address: String,

    /// The port the listener binds to
    #[arg(short, long, env, default_value = "5000")]
    pub(crate) port: u16,

    /// Path to the safetensors weights, relative to the repository when one is set
    #[arg(short, long, env, default_value = "mnist_model.safetensors")]
    pub(crate) model_path: String,

    /// Hugging Face Hub repository to download the weights from, empty for a local file
    #[arg(long, env, default_value = "")]
    pub(crate) model_repo: String,

    /// Revision of the Hugging Face Hub repository
    #[arg(long, env, default_value = "main")]
    pub(crate) model_revision: String,

    /// Network layout of the weights
    #[arg(long, env, value_enum, default_value = "convnet")]
    pub(crate) architecture: Architecture,

    /// Maximum accepted request body size in bytes
    #[arg(long, env, default_value = "10000000")]
    pub(crate) body_limit: usize,

    /// OTLP collector endpoint, empty disables trace and metric export
    #[arg(long, env, default_value = "")]
    pub(crate) otlp_endpoint: String,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        let config = toml::from_str(&str)?;
        Ok(config)
    }

    pub fn weight_source(&self) -> WeightSource {
        WeightSource::new(&self.model_path, &self.model_repo, &self.model_revision)
    }

    pub fn otlp_endpoint(&self) -> Option<&str> {
        Some(self.otlp_endpoint.as_str()).filter(|endpoint| !endpoint.is_empty())
    }
}
