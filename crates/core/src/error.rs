//! Error types for the Abunda knowledge assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application. Adapters classify transport failures into
//! `Unavailable` (the dependency cannot be reached) and `Timeout` (the call
//! took too long) so the knowledge engine can decide whether a failure
//! changes its state.

use thiserror::Error;

/// Unified error type for Abunda.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing endpoints, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation provider errors that are not connectivity problems
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base errors (embedding, chunking, collection handling)
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Vector store errors that are not connectivity problems
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A dependency could not be reached (connection refused, DNS, reset)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A dependency did not answer within the configured timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A specific document could not be ingested
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// The generation provider failed or returned malformed output
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error means a dependency connection was lost.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }

    /// Whether this error is a recoverable timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
