use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::inference::tensor::IMAGE_DIM;

const PIXELS_FIELD: &str = "pixels";

/// Parses a `{"pixels": [...]}` body into 784 row-major intensities.
///
/// The pixels are expected in the model's native polarity and are neither inverted
/// nor range checked.
pub fn parse_pixel_array(body: &[u8]) -> Result<Vec<f32>, PipelineError> {
    let request: Map<String, Value> =
        serde_json::from_slice(body).map_err(|_| PipelineError::MissingPixels)?;
    let Some(Value::Array(pixels)) = request.get(PIXELS_FIELD) else {
        return Err(PipelineError::MissingPixels);
    };

    if pixels.len() != IMAGE_DIM {
        return Err(PipelineError::InvalidLength {
            expected: IMAGE_DIM,
            actual: pixels.len(),
        });
    }

    pixels
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .as_f64()
                .map(|pixel| pixel as f32)
                .ok_or(PipelineError::InvalidPixel { index })
        })
        .collect()
}
