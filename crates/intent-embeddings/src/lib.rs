//! # intent-embeddings
//!
//! Embedding providers for the intent router.
//!
//! The retrieval core only sees the [`EmbeddingProvider`] capability:
//! initialize, embed, dimension, dispose. Two implementations ship here:
//!
//! - [`CandleEmbedder`]: local multilingual sentence-transformer via Candle,
//!   with model files fetched from HuggingFace Hub on first use
//! - [`HashingEmbedder`]: deterministic feature hashing, no model files

pub mod candle;
pub mod error;
pub mod hashing;
pub mod model;
pub mod model_store;

pub use crate::candle::{CandleEmbedder, DEFAULT_EMBEDDING_DIM};
pub use error::EmbeddingError;
pub use hashing::{HashingEmbedder, DEFAULT_HASHING_DIM};
pub use model::{normalize, Embedding, EmbeddingProvider, ModelInfo};
pub use model_store::{
    default_model_root, validate_repo_id, HubSource, InstalledModel, ModelFile, ModelManifest,
    ModelSource, ModelStore, DEFAULT_MODEL_REPO, MANIFEST_FILE,
};
