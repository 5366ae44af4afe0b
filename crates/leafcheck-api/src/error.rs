//! API error types.
//!
//! Every error renders as `{"error": "<message>"}`. Status codes and
//! messages are relied upon by the web frontend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use leafcheck_inference::ClassifyError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Modelo no cargado en el backend")]
    ModelNotLoaded,

    #[error("No se encontró el archivo")]
    MissingFile,

    #[error("No se seleccionó ningún archivo")]
    EmptyFilename,

    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Error interno del servidor: {0}")]
    Internal(String),

    #[error("Error interno del servidor: {0}")]
    Classify(#[from] ClassifyError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::EmptyFilename | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ModelNotLoaded | ApiError::Internal(_) | ApiError::Classify(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ModelNotLoaded => "model_not_loaded",
            ApiError::MissingFile => "missing_file",
            ApiError::EmptyFilename => "empty_filename",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) | ApiError::Classify(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
