use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, D};
use candle_nn::ops::softmax;
use candle_nn::{Module, VarBuilder};

use crate::inference::classifier::DigitClassifier;
use crate::inference::models::convnet::ConvNet;
use crate::inference::models::mlp::Mlp;
use crate::inference::models::model::{Architecture, WeightSource};
use crate::inference::tensor::NormalizedTensor;

#[derive(Debug, Clone)]
pub enum DigitModel {
    Mlp(Mlp),
    ConvNet(ConvNet),
}

impl DigitModel {
    #[tracing::instrument(level = "info")]
    pub fn load(architecture: Architecture, source: &WeightSource) -> Result<Self> {
        let weights = source.fetch()?;
        Self::from_safetensors(architecture, &weights)
    }

    pub fn from_safetensors(architecture: Architecture, path: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let tensors = candle_core::safetensors::load(path, &device)
            .with_context(|| format!("Failed to read weights from {}", path.display()))?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        Self::new(architecture, vb)
            .with_context(|| format!("Weights in {} do not fit a {architecture}", path.display()))
    }

    pub fn new(architecture: Architecture, vb: VarBuilder) -> Result<Self> {
        let model = match architecture {
            Architecture::Mlp => DigitModel::Mlp(Mlp::new(vb)?),
            Architecture::ConvNet => DigitModel::ConvNet(ConvNet::new(vb)?),
        };
        Ok(model)
    }
}

impl DigitClassifier for DigitModel {
    fn predict(&self, input: &NormalizedTensor) -> Result<Vec<Vec<f32>>> {
        let logits = match self {
            DigitModel::Mlp(model) => model.forward(input.tensor())?,
            DigitModel::ConvNet(model) => model.forward(input.tensor())?,
        };
        let probabilities = softmax(&logits, D::Minus1)?;
        Ok(probabilities.to_vec2::<f32>()?)
    }
}
