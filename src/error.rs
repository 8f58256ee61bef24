//! Error types for the detection service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    /// Upload could not be decoded, is empty, or has zero area.
    InvalidImage(String),
    /// Model file missing or session could not be built.
    ModelNotLoaded(String),
    /// Inference call failed or produced an unusable output.
    EngineFailure(String),
    /// PNG encoding of the annotated image failed.
    RenderFailure(String),
    BadRequest(String),
    Internal(String),
}

impl AppError {
    /// Machine-readable code used as the `error` field of the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidImage(_) => "invalid_image",
            AppError::ModelNotLoaded(_) => "model_not_loaded",
            AppError::EngineFailure(_) => "engine_failure",
            AppError::RenderFailure(_) => "render_failed",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidImage(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotLoaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EngineFailure(_) | AppError::RenderFailure(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidImage(msg) => write!(f, "Invalid image: {msg}"),
            AppError::ModelNotLoaded(msg) => write!(f, "Model not loaded: {msg}"),
            AppError::EngineFailure(msg) => write!(f, "Inference engine error: {msg}"),
            AppError::RenderFailure(msg) => write!(f, "Render error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {err}"))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::InvalidImage(format!("Image decode: {err}"))
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::EngineFailure(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Worker task failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(status = status.as_u16(), "{self}");

        let body = json!({
            "error": self.code(),
            "detail": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
