//! Errors raised while building or loading a test specification.

use thiserror::Error;

/// Errors that occur while constructing, encoding or decoding a [`crate::TestSpecification`].
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("unknown parameter type '{0}'")]
    UnknownType(String),

    #[error("invalid parameter '{0}': expected VALUE:TYPE")]
    InvalidParam(String),

    #[error("invalid parameter-list key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid expected output for '{key}': {reason}")]
    InvalidExpected { key: String, reason: String },

    #[error("target path '{0}' has no file name")]
    NoFileName(String),

    #[error("malformed test specification: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
