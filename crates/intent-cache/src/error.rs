//! Cache error types.
//!
//! [`CacheError`] is only returned by writes. Reads never fail: every
//! problem found while loading becomes a [`CacheMiss`] and the caller
//! recomputes.

use thiserror::Error;

/// Errors that can occur while writing or clearing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Items cannot be cached as given
    #[error("Invalid cache input: {0}")]
    InvalidInput(String),
}

/// Why a cache load was rejected. Reported in logs and diagnostics only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheMiss {
    #[error("payload file not found")]
    NotFound,

    #[error("payload unreadable: {0}")]
    Unreadable(String),

    #[error("payload missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),

    #[error("payload malformed: {0}")]
    Malformed(String),

    #[error("standalone metadata missing or diverges from payload")]
    MetadataDiverged,

    #[error("model mismatch: cached {cached}, requested {requested}")]
    ModelMismatch { cached: String, requested: String },

    #[error("dimension mismatch: cached {cached}, requested {requested}")]
    DimensionMismatch { cached: usize, requested: usize },

    #[error("cache expired: age {age_ms}ms exceeds {max_age_ms}ms")]
    Expired { age_ms: i64, max_age_ms: i64 },

    #[error("cache written in the future: updatedAt is {ahead_ms}ms ahead of now")]
    FutureTimestamp { ahead_ms: i64 },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("text hash mismatch for embedding {0}")]
    TextHashMismatch(String),

    #[error("vector length mismatch for embedding {0}")]
    VectorLength(String),

    #[error("embeddings and intents do not pair by id")]
    IntentMismatch,
}
