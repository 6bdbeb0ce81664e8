use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Client-caused failures of the prediction pipeline, each mapped to a 400 response.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("No file part")]
    MissingFile,
    #[error("Empty file")]
    MissingFilename,
    #[error("{0}")]
    MalformedUpload(String),
    #[error("Empty file content")]
    EmptyInput,
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Missing pixels array")]
    MissingPixels,
    #[error("Array must contain {expected} elements (28x28)")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Pixel values must be numbers")]
    InvalidPixel { index: usize },
    #[error("Invalid image shape after processing")]
    InvalidShape { actual: Vec<usize> },
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn log_rejection(&self) {
        match self {
            PipelineError::InvalidLength { expected, actual } => {
                warn!(expected, actual, "Rejected pixel array of the wrong length");
            }
            PipelineError::InvalidPixel { index } => {
                warn!(index, "Rejected non-numeric pixel");
            }
            PipelineError::InvalidShape { actual } => {
                warn!(?actual, "Rejected input that does not fit the model");
            }
            _ => warn!("Rejected request: {self}"),
        }
    }
}

// Taken from https://github.com/tokio-rs/axum/blob/main/examples/anyhow-error-response/src/main.rs
#[derive(Debug)]
pub struct DigitRunnerError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

#[derive(Debug, Serialize)]
pub struct HttpErrorResponse {
    error: String,
}

impl From<String> for HttpErrorResponse {
    fn from(message: String) -> Self {
        HttpErrorResponse { error: message }
    }
}

impl IntoResponse for DigitRunnerError {
    fn into_response(self) -> Response {
        let mut res = Json(self.message).into_response();
        *res.status_mut() = self.status;
        res
    }
}

impl<E> From<E> for DigitRunnerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
            pipeline_err.log_rejection();
            return DigitRunnerError {
                status: pipeline_err.status(),
                message: HttpErrorResponse::from(pipeline_err.to_string()),
            };
        }

        error!("Prediction failed: {err:#}");
        DigitRunnerError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: HttpErrorResponse::from(format!("Processing error: {err}")),
        }
    }
}

pub type DigitResult<T, E = DigitRunnerError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn pipeline_errors_are_bad_requests() {
        let err = DigitRunnerError::from(PipelineError::InvalidLength {
            expected: 784,
            actual: 783,
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message.error, "Array must contain 784 elements (28x28)");
    }

    #[test]
    fn rejection_details_stay_out_of_the_message() {
        let rejections = [
            (PipelineError::InvalidPixel { index: 42 }, "Pixel values must be numbers"),
            (
                PipelineError::InvalidShape {
                    actual: vec![1, 784],
                },
                "Invalid image shape after processing",
            ),
            (PipelineError::MissingFilename, "Empty file"),
        ];

        for (rejection, message) in rejections {
            let err = DigitRunnerError::from(rejection);
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message.error, message);
        }
    }

    #[test]
    fn unclassified_errors_are_internal() {
        let err = DigitRunnerError::from(anyhow!("matmul shape mismatch"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message.error, "Processing error: matmul shape mismatch");
    }

    #[test]
    fn pipeline_error_survives_anyhow_wrapping() {
        let wrapped: anyhow::Error = PipelineError::EmptyInput.into();
        let err = DigitRunnerError::from(wrapped);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message.error, "Empty file content");
    }
}
