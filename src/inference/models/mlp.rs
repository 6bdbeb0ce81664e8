use candle_core::{Result, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

use crate::inference::tensor::{IMAGE_DIM, LABELS};

const HIDDEN: usize = 100;

// Taken from https://github.com/huggingface/candle/blob/main/candle-examples/examples/mnist-training/main.rs
#[derive(Debug, Clone)]
pub struct Mlp {
    ln1: Linear,
    ln2: Linear,
}

impl Mlp {
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let ln1 = linear(IMAGE_DIM, HIDDEN, vb.pp("ln1"))?;
        let ln2 = linear(HIDDEN, LABELS, vb.pp("ln2"))?;
        Ok(Self { ln1, ln2 })
    }
}

impl Module for Mlp {
    /// Maps a `(batch, 28, 28, 1)` input to `(batch, 10)` logits.
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        xs.flatten_from(1)?
            .apply(&self.ln1)?
            .relu()?
            .apply(&self.ln2)
    }
}
