//! Error types for the container layer.

use thiserror::Error;

/// Errors that can occur in container operations.
///
/// Only caller contract violations and host-boundary encoding failures
/// surface as errors; malformed remote operations are tolerated silently
/// by the merge paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("index {index} out of bounds (visible length {length})")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
