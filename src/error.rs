//! Error taxonomy for the hierarchy engine.
//!
//! Domain algorithms raise `NotFound`/`InvalidOperation` synchronously;
//! the use-case layer adds `NoActiveUnit` and surfaces adapter failures
//! as `Io` without reinterpreting them.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced node, unit, or parent does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Structurally illegal request, e.g. deleting the root or moving a
    /// node into its own subtree.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A mutation was attempted with no active document unit selected.
    #[error("no active document unit")]
    NoActiveUnit,

    /// An empty required field was supplied on value construction.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An underlying repository or media store operation failed.
    #[error("io failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}
