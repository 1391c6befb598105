//! Embedding cache persistence.
//!
//! Two JSON files live in the cache directory:
//! - `embeddings-cache.json`: {metadata, embeddings, intents}
//! - `cache-metadata.json`: a mirror of `metadata`
//!
//! A cache is served only if every check passes, in this order:
//! 1. payload file exists
//! 2. payload has the required top-level fields and parses
//! 3. standalone metadata exists and equals the payload metadata
//! 4. model path matches
//! 5. embedding dimension matches
//! 6. age is within the maximum
//! 7. recomputed checksum matches
//! 8. every text hash matches its text
//! 9. every vector has the cached dimension
//! 10. embeddings and intents pair one-to-one by id
//!
//! The first failure discards the whole cache. Nothing is repaired.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use intent_types::Intent;
use tracing::{debug, info};

use crate::checksum::{compute_checksum, text_hash};
use crate::error::{CacheError, CacheMiss};
use crate::types::{
    CacheItem, CacheMetadata, CachePayload, CacheStats, CacheValidation, CachedEmbedding,
    CachedModelInfo, CACHE_VERSION, METADATA_FILE, PAYLOAD_FILE, REQUIRED_FIELDS,
};

/// File-backed cache of intent embeddings for one directory.
///
/// Single-process only; concurrent writers to the same directory are
/// unsupported and the last writer wins.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
    max_age_ms: i64,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>, max_age_ms: i64) -> Self {
        Self {
            dir: dir.into(),
            max_age_ms,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_age_ms(&self) -> i64 {
        self.max_age_ms
    }

    pub fn payload_path(&self) -> PathBuf {
        self.dir.join(PAYLOAD_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Persist items computed with `model_path` at `dimension`.
    ///
    /// Writes the payload first and the metadata mirror last, each through
    /// a temp file and rename, so an interrupted save leaves the two files
    /// diverged and the next load rejects them.
    pub async fn save(
        &self,
        items: &[CacheItem],
        model_path: &str,
        dimension: usize,
    ) -> Result<CacheMetadata, CacheError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.intent.id) {
                return Err(CacheError::InvalidInput(format!(
                    "duplicate intent id {}",
                    item.intent.id
                )));
            }
            if item.vector.len() != dimension {
                return Err(CacheError::InvalidInput(format!(
                    "intent {} has {} dimensions, expected {}",
                    item.intent.id,
                    item.vector.len(),
                    dimension
                )));
            }
        }

        let now = Utc::now().timestamp_millis();
        let model_info = CachedModelInfo {
            model_path: model_path.to_string(),
            dimension,
        };

        let embeddings: Vec<CachedEmbedding> = items
            .iter()
            .map(|item| CachedEmbedding {
                id: item.intent.id.to_string(),
                text: item.intent.text.clone(),
                vector: item.vector.clone(),
                hash: text_hash(&item.intent.text),
                timestamp: now,
                model_info: Some(model_info.clone()),
            })
            .collect();

        let created_at = self
            .read_metadata()
            .await
            .filter(|m| m.model_path == model_path && m.embedding_dimension == dimension)
            .map(|m| m.created_at)
            .unwrap_or(now);

        let metadata = CacheMetadata {
            version: CACHE_VERSION.to_string(),
            created_at,
            updated_at: now,
            model_path: model_path.to_string(),
            embedding_dimension: dimension,
            total_intents: items.len(),
            checksum: compute_checksum(&embeddings),
        };

        let payload = CachePayload {
            metadata: metadata.clone(),
            embeddings,
            intents: items.iter().map(|item| item.intent.clone()).collect(),
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        write_atomic(&self.payload_path(), &serde_json::to_vec(&payload)?).await?;
        write_atomic(
            &self.metadata_path(),
            &serde_json::to_vec_pretty(&metadata)?,
        )
        .await?;

        info!(
            path = ?self.payload_path(),
            intents = items.len(),
            dim = dimension,
            "Saved embedding cache"
        );
        Ok(metadata)
    }

    /// Load items if a valid cache exists for `model_path` at `dimension`.
    ///
    /// Any failure is a silent miss: logged at debug, returned as `None`.
    pub async fn load(&self, model_path: &str, dimension: usize) -> Option<Vec<CacheItem>> {
        match self.try_load(model_path, dimension).await {
            Ok(items) => {
                info!(intents = items.len(), "Loaded embedding cache");
                Some(items)
            }
            Err(miss) => {
                debug!(reason = %miss, path = ?self.payload_path(), "Embedding cache miss");
                None
            }
        }
    }

    /// Run the full validation sequence without returning items.
    pub async fn validate_cache(&self, model_path: &str, dimension: usize) -> CacheValidation {
        match self.try_load(model_path, dimension).await {
            Ok(_) => CacheValidation::valid(),
            Err(miss) => CacheValidation::invalid(miss.to_string()),
        }
    }

    /// Remove all cache artifacts. Missing files are not an error.
    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        for path in [
            self.payload_path(),
            self.metadata_path(),
            tmp_path(&self.payload_path()),
            tmp_path(&self.metadata_path()),
        ] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = ?path, "Removed cache file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(dir = ?self.dir, "Cleared embedding cache");
        Ok(())
    }

    /// File sizes and standalone metadata. Does not validate.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let payload_bytes = file_len(&self.payload_path()).await;
        let metadata_bytes = file_len(&self.metadata_path()).await;
        let metadata = self.read_metadata().await;
        let age_ms = metadata
            .as_ref()
            .map(|m| Utc::now().timestamp_millis() - m.updated_at);

        CacheStats {
            exists: payload_bytes.is_some(),
            payload_bytes: payload_bytes.unwrap_or(0),
            metadata_bytes: metadata_bytes.unwrap_or(0),
            metadata,
            age_ms,
        }
    }

    async fn read_metadata(&self) -> Option<CacheMetadata> {
        let bytes = tokio::fs::read(self.metadata_path()).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn try_load(
        &self,
        model_path: &str,
        dimension: usize,
    ) -> Result<Vec<CacheItem>, CacheMiss> {
        // 1. payload exists
        let bytes = match tokio::fs::read(self.payload_path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(CacheMiss::NotFound),
            Err(e) => return Err(CacheMiss::Unreadable(e.to_string())),
        };

        // 2. required fields, then typed parse
        let payload = parse_payload(&bytes)?;
        let metadata = &payload.metadata;

        // 3. mirror agrees
        match self.read_metadata().await {
            Some(mirror) if mirror == *metadata => {}
            _ => return Err(CacheMiss::MetadataDiverged),
        }

        // 4. model
        if metadata.model_path != model_path {
            return Err(CacheMiss::ModelMismatch {
                cached: metadata.model_path.clone(),
                requested: model_path.to_string(),
            });
        }

        // 5. dimension
        if metadata.embedding_dimension != dimension {
            return Err(CacheMiss::DimensionMismatch {
                cached: metadata.embedding_dimension,
                requested: dimension,
            });
        }

        // 6. age
        let age_ms = Utc::now().timestamp_millis() - metadata.updated_at;
        if age_ms < 0 {
            return Err(CacheMiss::FutureTimestamp { ahead_ms: -age_ms });
        }
        if age_ms > self.max_age_ms {
            return Err(CacheMiss::Expired {
                age_ms,
                max_age_ms: self.max_age_ms,
            });
        }

        // 7. checksum
        if compute_checksum(&payload.embeddings) != metadata.checksum {
            return Err(CacheMiss::ChecksumMismatch);
        }

        // 8, 9. per-embedding integrity
        for embedding in &payload.embeddings {
            if text_hash(&embedding.text) != embedding.hash {
                return Err(CacheMiss::TextHashMismatch(embedding.id.clone()));
            }
            if embedding.vector.len() != dimension {
                return Err(CacheMiss::VectorLength(embedding.id.clone()));
            }
        }

        // 10. pairing
        pair_by_id(payload)
    }
}

fn parse_payload(bytes: &[u8]) -> Result<CachePayload, CacheMiss> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CacheMiss::Malformed(e.to_string()))?;

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| value.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(CacheMiss::MissingFields(missing));
    }

    serde_json::from_value(value).map_err(|e| CacheMiss::Malformed(e.to_string()))
}

/// Join embeddings to intents, preserving embedding order.
fn pair_by_id(payload: CachePayload) -> Result<Vec<CacheItem>, CacheMiss> {
    if payload.embeddings.len() != payload.intents.len()
        || payload.intents.len() != payload.metadata.total_intents
    {
        return Err(CacheMiss::IntentMismatch);
    }

    let mut intents: HashMap<String, Intent> = payload
        .intents
        .into_iter()
        .map(|intent| (intent.id.to_string(), intent))
        .collect();

    let mut items = Vec::with_capacity(payload.embeddings.len());
    for embedding in payload.embeddings {
        let intent = intents
            .remove(&embedding.id)
            .ok_or(CacheMiss::IntentMismatch)?;
        if intent.text != embedding.text {
            return Err(CacheMiss::IntentMismatch);
        }
        items.push(CacheItem::new(intent, embedding.vector));
    }
    Ok(items)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn file_len(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}
