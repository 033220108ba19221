//! Error taxonomy for graph operations and analytics.

use thiserror::Error;

/// Failures raised by the cast graph and its analyzers.
///
/// Every variant names the lookup or node that caused it so a batch run
/// can abort with enough context to diagnose the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid {kind}: {reason}")]
    InvalidEntity { kind: &'static str, reason: String },

    #[error("Unknown {kind}: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Non-integer year for '{name}': >{year}<")]
    InvalidYear { name: String, year: String },

    #[error("Invariant violated at {node}: {detail}")]
    InvariantViolation { node: String, detail: String },

    #[error("Undefined ratio: {context}")]
    UndefinedRatio { context: String },

    #[error("Graph too large for all-pairs shortest paths: {nodes} nodes (limit {limit})")]
    TooLarge { nodes: usize, limit: usize },

    #[error("Invalid year window: {0}")]
    InvalidWindow(String),
}

impl GraphError {
    pub(crate) fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn violation(node: impl ToString, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            node: node.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
