//! Errors raised while reading roster input.

use thiserror::Error;

/// Failures while reading or parsing a roster.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed roster line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, RosterError>;
