// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::chain::ChainError;
use crate::clients::ClientError;
use crate::store::nonce::AuthFlowError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Every variant except `Internal` carries a short `error` label and a longer
/// `message`, matching the `{error, message}` body the API returns on failure.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request (missing/malformed fields)
    Validation(String, String),

    // 404 Not Found (missing session/address/token)
    NotFound(String, String),

    // 400 Conflict-style rejection (already-active session, already-pending, ...)
    Conflict(String, String),

    // 400 auth failure (invalid/expired nonce)
    Auth(String, String),

    // 502-ish failures from collaborators (contract call, IPFS, AI service),
    // surfaced as 500 with the underlying message
    External(String, String),

    // 500 Internal Server Error
    Internal(String),
}

impl AppError {
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(error.into(), message.into())
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::NotFound(error.into(), message.into())
    }

    pub fn conflict(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict(error.into(), message.into())
    }

    pub fn auth(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Auth(error.into(), message.into())
    }

    pub fn external(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::External(error.into(), message.into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Validation(error, message) => (StatusCode::BAD_REQUEST, error, message),
            AppError::NotFound(error, message) => (StatusCode::NOT_FOUND, error, message),
            AppError::Conflict(error, message) => (StatusCode::BAD_REQUEST, error, message),
            AppError::Auth(error, message) => (StatusCode::BAD_REQUEST, error, message),
            AppError::External(error, message) => {
                tracing::error!("External service failure: {}: {}", error, message);
                (StatusCode::INTERNAL_SERVER_ERROR, error, message)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    msg,
                )
            }
        };
        let body = Json(json!({
            "error": error,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Contract call failures surface the underlying node message verbatim.
impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        AppError::External("Blockchain call failed".to_string(), err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::External("External service call failed".to_string(), err.to_string())
    }
}

impl From<AuthFlowError> for AppError {
    fn from(err: AuthFlowError) -> Self {
        AppError::Auth(err.to_string(), err.detail().to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation("Invalid JSON".to_string(), err.to_string())
    }
}
