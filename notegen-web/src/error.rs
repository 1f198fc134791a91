//! Error types for the web front end
//!
//! Every error becomes `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Note generation error
    #[error(transparent)]
    Generation(#[from] notegen::Error),

    /// notegen-common error
    #[error("Common error: {0}")]
    Common(#[from] notegen_common::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        use notegen::Error as GenError;
        use notegen_common::Error as CommonError;

        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Generation(GenError::Inference(_)) => {
                (StatusCode::BAD_GATEWAY, "INFERENCE_ERROR")
            }
            ApiError::Generation(GenError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Generation(GenError::Csv(_)) => (StatusCode::BAD_REQUEST, "BAD_CSV"),
            ApiError::Generation(GenError::Io(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR")
            }
            ApiError::Generation(GenError::Common(err)) | ApiError::Common(err) => match err {
                CommonError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
                CommonError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        } else {
            tracing::warn!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
