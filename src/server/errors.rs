//! Mapping of service errors onto HTTP responses.
//!
//! Every failed request passes through [`map_error`] exactly once, from the
//! `IntoResponse` impl of [`ServiceError`]. The body is always:
//!
//! ```json
//! { "code": "NOT_FOUND", "message": "image g1/abc.ppm not found" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{DomainError, ErrorCode, ServiceError};

/// Code reported for errors that are not domain errors.
pub const INTERNAL_CODE: &str = "INTERNAL";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// An error translated into HTTP terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

/// HTTP status for a domain error code.
///
/// Codes without an entry of their own are treated as client errors.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Exists => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ReadError | ErrorCode::WriteError | ErrorCode::UnlinkError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ErrorCode::Missing | ErrorCode::BadRequest | ErrorCode::BadFormat | ErrorCode::BadMsg => {
            StatusCode::BAD_REQUEST
        }
    }
}

/// Translate an error into status, code and message.
pub fn map_error(err: &ServiceError) -> MappedError {
    match err {
        ServiceError::Domain(DomainError { code, message }) => MappedError {
            status: status_for(*code),
            code: code.as_str().to_string(),
            message: message.clone(),
        },
        ServiceError::Internal(message) => MappedError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: INTERNAL_CODE.to_string(),
            message: message.clone(),
        },
    }
}

/// Build a `MISSING` error naming every absent field, or `None` if all are
/// present.
///
/// Fields are given as `(name, present)` pairs and reported in order.
pub fn check_missing(fields: &[(&str, bool)]) -> Option<DomainError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        return None;
    }
    Some(missing_fields(&missing))
}

/// A `MISSING` error naming `fields`.
pub fn missing_fields(fields: &[&str]) -> DomainError {
    DomainError::new(
        ErrorCode::Missing,
        format!("field(s) {} not specified", fields.join(", ")),
    )
}

/// Convert ServiceError to HTTP response.
///
/// Logs one line per error:
/// - 5xx errors at ERROR level
/// - 404 at DEBUG level (common and expected)
/// - other 4xx at WARN level
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mapped = map_error(&self);

        if mapped.status.is_server_error() {
            error!(
                code = %mapped.code,
                status = mapped.status.as_u16(),
                "Server error: {}",
                mapped.message
            );
        } else if mapped.status == StatusCode::NOT_FOUND {
            debug!(
                code = %mapped.code,
                status = mapped.status.as_u16(),
                "Not found: {}",
                mapped.message
            );
        } else {
            warn!(
                code = %mapped.code,
                status = mapped.status.as_u16(),
                "Client error: {}",
                mapped.message
            );
        }

        let body = ErrorResponse {
            code: mapped.code,
            message: mapped.message,
        };
        (mapped.status, Json(body)).into_response()
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        ServiceError::Domain(self).into_response()
    }
}
