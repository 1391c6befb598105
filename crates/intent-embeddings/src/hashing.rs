//! Feature-hashing embedding provider.
//!
//! Produces deterministic unit vectors by hashing terms into fixed-dimension
//! buckets. Latin-script text contributes lowercase word tokens; CJK, kana
//! and hangul runs contribute single characters and character bigrams, since
//! those scripts do not separate words with spaces.
//!
//! Not semantically rich, but needs no model files, which makes it the
//! provider of choice for offline use and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::model::{ensure_not_empty, normalize, Embedding, EmbeddingProvider, ModelInfo};

/// Default dimension for hashed vectors
pub const DEFAULT_HASHING_DIM: usize = 256;

/// Deterministic bag-of-terms embedder.
pub struct HashingEmbedder {
    info: ModelInfo,
    initialized: bool,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo {
                model_id: format!("hashing-{}", dimension),
                dimension,
                max_sequence_length: usize::MAX,
            },
            initialized: false,
        }
    }

    /// Compute the vector synchronously. Does not check initialization.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let dims = self.info.dimension;
        let mut counts: HashMap<String, f32> = HashMap::new();
        for term in terms(text) {
            *counts.entry(term).or_default() += 1.0;
        }

        let mut vector = vec![0.0f32; dims];
        for (term, count) in counts {
            let digest = blake3::hash(term.as_bytes());
            let bytes = digest.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % dims;
            // A second digest bit picks the sign, reducing collision bias
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * count;
        }

        normalize(vector)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30ff}'   // hiragana, katakana
        | '\u{3400}'..='\u{4dbf}' // CJK extension A
        | '\u{4e00}'..='\u{9fff}' // CJK unified ideographs
        | '\u{ac00}'..='\u{d7af}' // hangul syllables
        | '\u{1100}'..='\u{11ff}' // hangul jamo
    )
}

/// Split text into hashed terms.
fn terms(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut word = String::new();
    let mut run: Vec<char> = Vec::new();

    let flush_word = |word: &mut String, out: &mut Vec<String>| {
        if !word.is_empty() {
            out.push(std::mem::take(word));
        }
    };
    let flush_run = |run: &mut Vec<char>, out: &mut Vec<String>| {
        for c in run.iter() {
            out.push(c.to_string());
        }
        for pair in run.windows(2) {
            out.push(pair.iter().collect());
        }
        run.clear();
    };

    for c in text.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut out);
            run.push(c);
        } else if c.is_alphanumeric() {
            flush_run(&mut run, &mut out);
            word.extend(c.to_lowercase());
        } else {
            flush_word(&mut word, &mut out);
            flush_run(&mut run, &mut out);
        }
    }
    flush_word(&mut word, &mut out);
    flush_run(&mut run, &mut out);

    out
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn initialize(&mut self) -> Result<(), EmbeddingError> {
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if !self.initialized {
            return Err(EmbeddingError::NotInitialized);
        }
        ensure_not_empty(text)?;
        Ok(Embedding::from_normalized(self.vectorize(text)))
    }

    async fn dispose(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ready() -> HashingEmbedder {
        let mut embedder = HashingEmbedder::default();
        embedder.initialize().await.unwrap();
        embedder
    }

    #[test]
    fn test_terms_latin_and_cjk() {
        assert_eq!(terms("Check MY points!"), vec!["check", "my", "points"]);
        assert_eq!(terms("查询积分"), vec!["查", "询", "积", "分", "查询", "询积", "积分"]);
        assert_eq!(terms("add 设备"), vec!["add", "设", "备", "设备"]);
    }

    #[tokio::test]
    async fn test_deterministic_unit_vectors() {
        let embedder = ready().await;
        let a = embedder.embed("check my points").await.unwrap();
        let b = embedder.embed("check my points").await.unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(a.dimension(), DEFAULT_HASHING_DIM);
    }

    #[tokio::test]
    async fn test_shared_terms_raise_similarity() {
        let embedder = ready().await;
        let query = embedder.embed("check my points").await.unwrap();
        let close = embedder.embed("check points").await.unwrap();
        let far = embedder.embed("list all devices").await.unwrap();

        assert!(query.cosine_similarity(&close) > 0.65);
        assert!(query.cosine_similarity(&close) > query.cosine_similarity(&far));
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let mut embedder = HashingEmbedder::new(64);
        assert!(matches!(
            embedder.embed("hello").await,
            Err(EmbeddingError::NotInitialized)
        ));

        embedder.initialize().await.unwrap();
        assert!(matches!(
            embedder.embed("  ").await,
            Err(EmbeddingError::EmptyInput)
        ));

        embedder.dispose().await;
        assert!(!embedder.is_initialized());
        assert_eq!(embedder.model_id(), "hashing-64");
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let embedder = ready().await;
        let batch = embedder.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(batch[0], embedder.embed("one").await.unwrap());
        assert_eq!(batch[1], embedder.embed("two").await.unwrap());
    }
}
