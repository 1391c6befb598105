//! Embedding provider capability and vector type.
//!
//! Providers own external resources (model weights, tokenizers) and follow
//! an explicit lifecycle: `initialize()` before use, `dispose()` to release.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Vector embedding - a normalized float array.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector (normalized to unit length)
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: normalize(values),
        }
    }

    /// Create embedding without normalization (for pre-normalized vectors)
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Compute cosine similarity with another embedding.
    /// Returns value in [-1, 1] range (1 = identical).
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        // Both are normalized, so the dot product is the cosine
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(values: Vec<f32>) -> Vec<f32> {
    let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter().map(|x| x / norm).collect()
    } else {
        values
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Stable identifier recorded in cache metadata (repo id or synthetic name)
    pub model_id: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length in tokens
    pub max_sequence_length: usize,
}

/// Capability interface over an external embedding model.
///
/// `dimension()` is stable for the provider's lifetime. `embed` fails with
/// [`EmbeddingError::EmptyInput`] on blank text and
/// [`EmbeddingError::NotInitialized`] before `initialize()`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Load model resources. Calling twice is a no-op.
    async fn initialize(&mut self) -> Result<(), EmbeddingError>;

    fn is_initialized(&self) -> bool;

    fn info(&self) -> &ModelInfo;

    fn dimension(&self) -> usize {
        self.info().dimension
    }

    fn model_id(&self) -> &str {
        &self.info().model_id
    }

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Generate embeddings for multiple texts, in input order.
    /// Default implementation calls `embed()` for each text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Release model resources. Idempotent.
    async fn dispose(&mut self);
}

/// Reject blank input before it reaches a model.
pub(crate) fn ensure_not_empty(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        Err(EmbeddingError::EmptyInput)
    } else {
        Ok(())
    }
}
