//! Error types for Prever operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Prever operations.
///
/// The only hard failures in the core are "predictor not ready" and
/// "model store absent"; everything else is either handled locally
/// (empty results, default sub-vectors) or caught at construction time
/// (catalog validation).
#[derive(Debug)]
pub enum PreverError {
    /// Predictor invoked before training or loading a model.
    NotTrained,

    /// Model store absent at load time.
    ModelNotFound {
        /// Path that was probed
        path: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Construction-time validation failed (catalog slots, curriculum edges).
    ValidationError {
        /// Validation failure message
        message: String,
    },

    /// Serialization/deserialization error.
    Serialization(String),

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for PreverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreverError::NotTrained => {
                write!(f, "Model not trained: call train() or load() first")
            }
            PreverError::ModelNotFound { path } => {
                write!(f, "No trained model found at {path}")
            }
            PreverError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            PreverError::ValidationError { message } => {
                write!(f, "Validation failed: {message}")
            }
            PreverError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            PreverError::Io(e) => write!(f, "I/O error: {e}"),
            PreverError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PreverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PreverError {
    fn from(err: std::io::Error) -> Self {
        PreverError::Io(err)
    }
}

impl From<&str> for PreverError {
    fn from(msg: &str) -> Self {
        PreverError::Other(msg.to_string())
    }
}

impl From<String> for PreverError {
    fn from(msg: String) -> Self {
        PreverError::Other(msg)
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, PreverError>;
