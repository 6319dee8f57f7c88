/*
 * Responsibility
 * - App-wide AppError definition
 * - IntoResponse (HTTP status / JSON error body)
 * - Map core DPoP errors to status codes without revealing which check failed
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::dpop::DpopError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "DPoP proof rejected".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DpopError> for AppError {
    fn from(e: DpopError) -> Self {
        // Every verification outcome (and an unknown client) looks the same to the caller.
        if e.is_rejection() || matches!(e, DpopError::UnknownClient) {
            return AppError::Unauthorized;
        }
        match e {
            DpopError::MissingField(field) => {
                AppError::bad_request("MISSING_FIELD", format!("missing field: {field}"))
            }
            DpopError::MalformedKey(_) => AppError::bad_request("MALFORMED_KEY", "malformed key"),
            DpopError::UnsupportedAlgorithm(alg) => AppError::bad_request(
                "UNSUPPORTED_ALGORITHM",
                format!("unsupported algorithm: {alg}"),
            ),
            _ => AppError::Internal,
        }
    }
}
