use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes raised by image stores, the steg codec and request
/// validation.
///
/// The serialized form (e.g. `NOT_FOUND`) is what clients see in the `code`
/// field of error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// An image with the assigned identifier already exists
    Exists,

    /// The requested group/name/type does not exist
    NotFound,

    /// The store failed to read an image
    ReadError,

    /// The store failed to write an image
    WriteError,

    /// The store failed to remove an image
    UnlinkError,

    /// Required request fields were not supplied
    Missing,

    /// The request body could not be interpreted
    BadRequest,

    /// Image bytes are not in the expected format
    BadFormat,

    /// The message cannot be hidden in, or recovered from, the image
    BadMsg,
}

impl ErrorCode {
    /// The wire representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Exists => "EXISTS",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ReadError => "READ_ERROR",
            ErrorCode::WriteError => "WRITE_ERROR",
            ErrorCode::UnlinkError => "UNLINK_ERROR",
            ErrorCode::Missing => "MISSING",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::BadFormat => "BAD_FORMAT",
            ErrorCode::BadMsg => "BAD_MSG",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged, expected failure raised by a store or codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Exists, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReadError, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::WriteError, message)
    }
}

/// Errors surfaced by handlers.
///
/// `Domain` errors carry a stable code from the table in [`ErrorCode`];
/// everything else is `Internal` and is reported as a server fault.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Wrap an unexpected failure.
    pub fn internal(err: impl fmt::Display) -> Self {
        ServiceError::Internal(err.to_string())
    }

    /// The domain code, if this is a domain error.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ServiceError::Domain(err) => Some(err.code),
            ServiceError::Internal(_) => None,
        }
    }
}

/// Errors that can occur when parsing a binary PPM (`P6`) image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PpmError {
    /// Missing `P6` magic number
    #[error("not a binary PPM image: expected magic P6")]
    InvalidMagic,

    /// Header ended before all fields were read
    #[error("PPM header truncated while reading {0}")]
    TruncatedHeader(&'static str),

    /// Header field is not a positive decimal number
    #[error("invalid PPM {field}: {value}")]
    InvalidHeaderField { field: &'static str, value: String },

    /// Two-byte samples are not supported
    #[error("unsupported PPM max value {0} (must be 1-255)")]
    UnsupportedMaxValue(u32),

    /// Raster size does not match the header dimensions
    #[error("PPM pixel data has {actual} bytes, header requires {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
}

impl From<PpmError> for DomainError {
    fn from(err: PpmError) -> Self {
        DomainError::new(ErrorCode::BadFormat, err.to_string())
    }
}

impl From<PpmError> for ServiceError {
    fn from(err: PpmError) -> Self {
        ServiceError::Domain(err.into())
    }
}
