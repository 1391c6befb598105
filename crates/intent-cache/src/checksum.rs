//! Digests for cache integrity.
//!
//! The checksum covers the sorted set of "id:hash:timestamp" tuples, so it
//! does not depend on embedding order or on filesystem timestamps.

use crate::types::CachedEmbedding;

/// Hex digest of an intent's text.
pub fn text_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Checksum over all cached embeddings.
pub fn compute_checksum(embeddings: &[CachedEmbedding]) -> String {
    let mut tuples: Vec<String> = embeddings
        .iter()
        .map(|e| format!("{}:{}:{}", e.id, e.hash, e.timestamp))
        .collect();
    tuples.sort();

    let mut hasher = blake3::Hasher::new();
    for tuple in &tuples {
        hasher.update(tuple.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
