//! # intent-cache
//!
//! Persists precomputed intent embeddings so the router can start without
//! re-embedding the whole catalog.
//!
//! A cache is only served when it was produced by the same model at the
//! same dimension, is younger than the configured maximum age, and its
//! checksum still matches. Anything else is a silent miss and the caller
//! recomputes; a bad cache is discarded whole, never patched.

pub mod checksum;
pub mod error;
pub mod store;
pub mod types;

pub use checksum::{compute_checksum, text_hash};
pub use error::{CacheError, CacheMiss};
pub use store::EmbeddingCache;
pub use types::{
    CacheItem, CacheMetadata, CachePayload, CacheStats, CacheValidation, CachedEmbedding,
    CachedModelInfo, CACHE_VERSION, METADATA_FILE, PAYLOAD_FILE,
};
