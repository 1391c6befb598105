//! Vector index error types.

use thiserror::Error;

/// Errors that can occur during vector operations.
///
/// Outside of initialization these indicate a wiring bug, not bad input.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Backend (usearch) error
    #[error("Index error: {0}")]
    Index(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Intent id already present in this index generation
    #[error("Duplicate intent: {0}")]
    DuplicateIntent(u64),

    /// Index not initialized
    #[error("Index not initialized")]
    NotInitialized,

    /// `initialize()` called on a live index
    #[error("Index already initialized with dimension {0}")]
    AlreadyInitialized(usize),

    /// Zero dimension requested
    #[error("Invalid dimension: {0}")]
    InvalidDimension(usize),
}
