use candle_core::{Result, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Linear, Module, VarBuilder};

use crate::inference::tensor::LABELS;

// Taken from https://github.com/huggingface/candle/blob/main/candle-examples/examples/mnist-training/main.rs
#[derive(Debug, Clone)]
pub struct ConvNet {
    conv1: Conv2d,
    conv2: Conv2d,
    fc1: Linear,
    fc2: Linear,
}

impl ConvNet {
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let conv1 = conv2d(1, 32, 5, Default::default(), vb.pp("c1"))?;
        let conv2 = conv2d(32, 64, 5, Default::default(), vb.pp("c2"))?;
        // 28 -> conv 24 -> pool 12 -> conv 8 -> pool 4, with 64 channels
        let fc1 = linear(1024, 1024, vb.pp("fc1"))?;
        let fc2 = linear(1024, LABELS, vb.pp("fc2"))?;
        Ok(Self {
            conv1,
            conv2,
            fc1,
            fc2,
        })
    }
}

impl Module for ConvNet {
    /// Maps a channels-last `(batch, 28, 28, 1)` input to `(batch, 10)` logits.
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        // candle convolutions expect channels first
        xs.permute((0, 3, 1, 2))?
            .contiguous()?
            .apply(&self.conv1)?
            .max_pool2d(2)?
            .apply(&self.conv2)?
            .max_pool2d(2)?
            .flatten_from(1)?
            .apply(&self.fc1)?
            .relu()?
            .apply(&self.fc2)
    }
}
