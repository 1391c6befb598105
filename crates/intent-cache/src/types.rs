//! On-disk cache records.
//!
//! Field names are camelCase so the JSON stays readable by hand.

use intent_types::Intent;
use serde::{Deserialize, Serialize};

/// Current cache format version
pub const CACHE_VERSION: &str = "1.0";

/// Combined payload file {metadata, embeddings, intents}
pub const PAYLOAD_FILE: &str = "embeddings-cache.json";

/// Standalone mirror of the payload metadata
pub const METADATA_FILE: &str = "cache-metadata.json";

/// Top-level fields a payload must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["metadata", "embeddings", "intents"];

/// Model that produced a cached vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedModelInfo {
    pub model_path: String,
    pub dimension: usize,
}

/// One cached vector and the text it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEmbedding {
    /// Intent id, as a string
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    /// Digest of `text`
    pub hash: String,
    /// When the vector was computed (ms since epoch)
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<CachedModelInfo>,
}

/// Cache-wide metadata, written to both files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: String,
    /// ms since epoch
    pub created_at: i64,
    /// ms since epoch; drives expiry
    pub updated_at: i64,
    pub model_path: String,
    pub embedding_dimension: usize,
    pub total_intents: usize,
    /// Digest over sorted "id:hash:timestamp" tuples
    pub checksum: String,
}

/// Full payload file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePayload {
    pub metadata: CacheMetadata,
    pub embeddings: Vec<CachedEmbedding>,
    pub intents: Vec<Intent>,
}

/// An intent with its computed vector; the unit the cache saves and loads.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    pub intent: Intent,
    pub vector: Vec<f32>,
}

impl CacheItem {
    pub fn new(intent: Intent, vector: Vec<f32>) -> Self {
        Self { intent, vector }
    }
}

/// Outcome of a read-only validation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheValidation {
    pub valid: bool,
    /// First failing check, when invalid
    pub reason: Option<String>,
}

impl CacheValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Read-only cache diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Whether the payload file exists
    pub exists: bool,
    pub payload_bytes: u64,
    pub metadata_bytes: u64,
    /// Standalone metadata, when readable
    pub metadata: Option<CacheMetadata>,
    /// Time since `metadata.updated_at`
    pub age_ms: Option<i64>,
}
