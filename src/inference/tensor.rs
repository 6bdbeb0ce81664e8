use candle_core::{Device, Tensor};

use crate::error::PipelineError;

pub const IMAGE_SIDE: usize = 28;
pub const IMAGE_DIM: usize = IMAGE_SIDE * IMAGE_SIDE;
pub const LABELS: usize = 10;

/// Batch, height, width, channels.
pub const INPUT_SHAPE: (usize, usize, usize, usize) = (1, IMAGE_SIDE, IMAGE_SIDE, 1);

const MAX_INTENSITY: f32 = 255.0;

/// The only input representation the classifier accepts: a single 28x28 grayscale
/// image laid out as `(1, 28, 28, 1)` and scaled down by 255.
#[derive(Debug, Clone)]
pub struct NormalizedTensor(Tensor);

impl NormalizedTensor {
    /// Scales row-major 0-255 intensities into the classifier's input tensor.
    ///
    /// Values are not clamped, so intensities outside 0-255 end up outside [0, 1].
    pub fn from_intensities(intensities: Vec<f32>) -> Result<Self, PipelineError> {
        let actual = vec![intensities.len()];
        let scaled: Vec<f32> = intensities
            .into_iter()
            .map(|value| value / MAX_INTENSITY)
            .collect();

        let tensor = Tensor::from_vec(scaled, INPUT_SHAPE, &Device::Cpu)
            .map_err(|_| PipelineError::InvalidShape { actual })?;
        Self::try_from(tensor)
    }

    pub fn tensor(&self) -> &Tensor {
        &self.0
    }
}

impl TryFrom<Tensor> for NormalizedTensor {
    type Error = PipelineError;

    fn try_from(tensor: Tensor) -> Result<Self, Self::Error> {
        match tensor.dims4() {
            Ok(dims) if dims == INPUT_SHAPE => Ok(Self(tensor)),
            _ => Err(PipelineError::InvalidShape {
                actual: tensor.dims().to_vec(),
            }),
        }
    }
}
