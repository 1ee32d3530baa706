use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::web::handlers::ApiResponse;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scan store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ScanError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            ScanError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ScanError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            ScanError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ScanError::Base64(_) => StatusCode::BAD_REQUEST,
            ScanError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            ScanError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ScanError::NotFound(_) => "NOT_FOUND",
            ScanError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ScanError::Inference(_) => "INFERENCE_ERROR",
            ScanError::InvalidInput(_) => "INVALID_INPUT",
            ScanError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            ScanError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ScanError::Config(_) => "CONFIG_ERROR",
            ScanError::Store(_) => "STORE_ERROR",
            ScanError::Io(_) => "IO_ERROR",
            ScanError::Json(_) => "JSON_ERROR",
            ScanError::Base64(_) => "BASE64_DECODE_ERROR",
            ScanError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            ScanError::Ort(_) => "ORT_ERROR",
            ScanError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ApiResponse::<()>::error(self.error_code(), self.to_string());

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
