//! Error types for the retrieval engine.

use intent_cache::CacheError;
use intent_embeddings::EmbeddingError;
use intent_vector::VectorError;
use thiserror::Error;

/// Errors raised by [`crate::RetrievalEngine`].
///
/// `query()` only ever returns [`EngineError::NotInitialized`]; embedding and
/// search failures inside a query are turned into a failed `QueryResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Provider load, index setup or configuration failure
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Engine used before `initialize()` completed, or after `dispose()`
    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
