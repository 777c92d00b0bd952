// Error Handling - Uniform Response Envelopes
//
// Every failure leaves the service as `{"success": false, "error": "..."}`
// with a status matching its kind: client errors for validation, 401 for
// rejected credentials, 502 for upstream ERP failures. Backend-provided
// messages are passed through when human-readable; internal errors are
// logged server-side with full detail and surface only a generic message,
// never a stack trace or backend internals.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::erp::ErpServiceError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] JsonRejection),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ErpServiceError> for AppError {
    fn from(err: ErpServiceError) -> Self {
        match err {
            ErpServiceError::Validation(msg) => AppError::BadRequest(msg),
            ErpServiceError::Auth(msg) => AppError::Unauthorized(msg),
            ErpServiceError::Upstream(msg) => AppError::BadGateway(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(ref e) => {
                (StatusCode::BAD_REQUEST, format!("Validation failed: {}", e))
            }
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(err) => {
                // Full detail stays server-side.
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
