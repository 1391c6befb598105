//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model file not found or unusable
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// Download error
    #[error("Failed to download model: {0}")]
    Download(String),

    /// Repository id is not a plain `owner/name` pair
    #[error("Invalid model repository id: {0:?}")]
    InvalidRepoId(String),

    /// Unreadable or unwritable install manifest
    #[error("Model manifest error: {0}")]
    Manifest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider used before `initialize()` or after `dispose()`
    #[error("Embedding provider not initialized")]
    NotInitialized,

    /// Empty or whitespace-only text
    #[error("Cannot embed empty input")]
    EmptyInput,

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
