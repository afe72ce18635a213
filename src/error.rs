use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{error, warn};

use crate::models::ErrorResponse;

/// Everything that can go wrong while serving a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No file provided")]
    MissingFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("File exceeds the {0} byte upload limit")]
    TooLarge(usize),
    #[error("Malformed multipart payload: {0}")]
    Multipart(String),
    #[error("Invalid image file: {0}")]
    Decode(#[from] image::ImageError),
    // The runtime's message stays in the log; callers only get the fixed text.
    #[error("Model inference failed")]
    Inference(#[source] anyhow::Error),
    #[error("No class label for predicted index {0}")]
    UnknownClass(usize),
    #[error("Prediction worker failed")]
    Blocking,
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingFile | PredictError::EmptyFilename | PredictError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            PredictError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Decode(_)
            | PredictError::Inference(_)
            | PredictError::UnknownClass(_)
            | PredictError::Blocking => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            match self {
                PredictError::Inference(e) => error!("Prediction failed: {:#}", e),
                other => error!("Prediction failed: {}", other),
            }
        } else {
            warn!("Rejected upload: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_use_fixed_messages() {
        assert_eq!(PredictError::MissingFile.to_string(), "No file provided");
        assert_eq!(PredictError::EmptyFilename.to_string(), "No file selected");
        assert_eq!(PredictError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PredictError::EmptyFilename.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn inference_detail_is_not_exposed() {
        let err = PredictError::Inference(anyhow::anyhow!("shape mismatch in node conv_1"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Model inference failed");
    }

    #[test]
    fn lookup_miss_is_a_server_error() {
        let err = PredictError::UnknownClass(42);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "No class label for predicted index 42");
    }
}
