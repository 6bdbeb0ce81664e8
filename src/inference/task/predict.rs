use std::fmt::Display;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;

use crate::error::PipelineError;
use crate::inference::classifier::{classify, DigitClassifier, Prediction};
use crate::inference::image_decoder::decode_image;
use crate::inference::pixel_array::parse_pixel_array;
use crate::inference::tensor::NormalizedTensor;

pub const FILE_FIELD: &str = "file";

/// A validated request, one variant per input path.
#[derive(Debug)]
pub enum PredictionInput {
    ImageUpload(Bytes),
    PixelArray(Vec<f32>),
}

pub type PredictResponse = Prediction;

impl PredictionInput {
    /// Pulls the first `file` upload out of a form.
    ///
    /// Parts without a filename are plain form values, not uploads, and are skipped
    /// like any other part.
    pub async fn from_multipart(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, PipelineError> {
        let mut multipart = multipart.map_err(|_| PipelineError::MissingFile)?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| PipelineError::MalformedUpload(err.body_text()))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            match field.file_name() {
                None => continue,
                Some("") => return Err(PipelineError::MissingFilename),
                Some(_) => {}
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|err| PipelineError::MalformedUpload(err.body_text()))?;
            if bytes.is_empty() {
                return Err(PipelineError::EmptyInput);
            }
            return Ok(PredictionInput::ImageUpload(bytes));
        }

        Err(PipelineError::MissingFile)
    }

    pub fn from_json(body: &[u8]) -> Result<Self, PipelineError> {
        parse_pixel_array(body).map(PredictionInput::PixelArray)
    }

    pub fn into_tensor(self) -> Result<NormalizedTensor, PipelineError> {
        match self {
            PredictionInput::ImageUpload(bytes) => decode_image(&bytes),
            PredictionInput::PixelArray(pixels) => NormalizedTensor::from_intensities(pixels),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictionInput::ImageUpload(_) => "image",
            PredictionInput::PixelArray(_) => "pixels",
        }
    }
}

impl Display for PredictionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionInput::ImageUpload(bytes) => write!(f, "image of {} bytes", bytes.len()),
            PredictionInput::PixelArray(pixels) => write!(f, "array of {} pixels", pixels.len()),
        }
    }
}

pub trait PredictHandler {
    fn run_predict(&self, input: PredictionInput) -> Result<PredictResponse>;
}

impl<C> PredictHandler for C
where
    C: DigitClassifier + ?Sized,
{
    #[tracing::instrument(level = "info", skip_all, fields(input = %input))]
    fn run_predict(&self, input: PredictionInput) -> Result<PredictResponse> {
        let tensor = input.into_tensor()?;
        classify(self, &tensor)
    }
}
