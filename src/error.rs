//! Error types for LLR imputation

use thiserror::Error;

/// Result type alias for LLR operations
pub type Result<T> = std::result::Result<T, LlrError>;

/// Boxed lower-level cause carried by solver failures
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the LLR engine
#[derive(Error, Debug)]
pub enum LlrError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient training data: {found} complete rows, at least {required} required")]
    InsufficientTrainingData { found: usize, required: usize },

    #[error("Insufficient attributes to reconstruct: {found} known, at least {required} required")]
    InsufficientAttributes { found: usize, required: usize },

    #[error("Expected up to {requested} neighbors but the neighbor source returned none")]
    InsufficientNeighbors { requested: usize },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Solver failure: {reason}")]
    SolverFailure {
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Engine not trained")]
    NotTrained,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl LlrError {
    /// Solver failure without an underlying cause
    pub fn solver(reason: impl Into<String>) -> Self {
        LlrError::SolverFailure {
            reason: reason.into(),
            source: None,
        }
    }

    /// Solver failure wrapping a lower-level error
    pub fn solver_with_source(reason: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        LlrError::SolverFailure {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for LlrError {
    fn from(err: serde_json::Error) -> Self {
        LlrError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LlrError {
    fn from(err: ndarray::ShapeError) -> Self {
        LlrError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = LlrError::InsufficientTrainingData { found: 2, required: 3 };
        assert_eq!(
            err.to_string(),
            "Insufficient training data: 2 complete rows, at least 3 required"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LlrError = io_err.into();
        assert!(matches!(err, LlrError::IoError(_)));
    }

    #[test]
    fn test_solver_failure_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "factorization broke down");
        let err = LlrError::solver_with_source("optimizer gave up", cause);
        assert_eq!(err.to_string(), "Solver failure: optimizer gave up");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("factorization broke down"));
    }
}
