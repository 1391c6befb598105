//! Embedding cache lifecycle E2E tests for the intent router.
//!
//! Covers the cache as the engine sees it across restarts: reuse when
//! nothing changed, and a full re-embed whenever the model, the dimension,
//! the catalog, or the file contents no longer line up.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{counting_registry, points_catalog, TestHarness};
use intent_cache::{CacheItem, EmbeddingCache, PAYLOAD_FILE};
use intent_embeddings::{EmbeddingProvider, HashingEmbedder};
use intent_retrieval::{EngineState, RetrievalEngine};
use intent_types::{Language, Metric, Template};

const ONE_HOUR_MS: i64 = 3_600_000;

fn registry() -> intent_retrieval::ActionRegistry {
    counting_registry(Arc::new(AtomicUsize::new(0)))
}

async fn tamper_first_timestamp(harness: &TestHarness) {
    let path = harness.cache_dir.join(PAYLOAD_FILE);
    let bytes = tokio::fs::read(&path).await.unwrap();
    let mut payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let timestamp = payload["embeddings"][0]["timestamp"].as_i64().unwrap();
    payload["embeddings"][0]["timestamp"] = serde_json::json!(timestamp + 1);
    tokio::fs::write(&path, serde_json::to_vec(&payload).unwrap())
        .await
        .unwrap();
}

/// The second start of an unchanged engine embeds nothing.
#[tokio::test]
async fn test_restart_reuses_cache() {
    let harness = TestHarness::new();
    let config = harness.config(Metric::Cosine);

    let mut first = harness
        .ready_engine(config.clone(), points_catalog(), registry())
        .await;
    assert_eq!(harness.counters.batch_texts(), 4);
    assert!(!first.get_stats().await.loaded_from_cache);
    first.dispose().await;

    let mut second = harness
        .ready_engine(config, points_catalog(), registry())
        .await;
    let stats = second.get_stats().await;
    assert!(stats.loaded_from_cache);
    assert_eq!(stats.indexed_intents, 4);
    assert_eq!(harness.counters.batch_texts(), 4, "no catalog re-embed");

    let result = second.query("check points").await.unwrap();
    assert!(result.success);
    assert_eq!(result.matched_intent.unwrap().action, "getUserPoints");
}

/// A different model id or dimension never reuses the cache.
#[tokio::test]
async fn test_model_change_invalidates_cache() {
    let harness = TestHarness::new();
    let config = harness.config(Metric::Cosine);
    harness
        .ready_engine(config.clone(), points_catalog(), registry())
        .await;

    let mut other = RetrievalEngine::new(
        config.clone(),
        Box::new(HashingEmbedder::new(128)),
        points_catalog(),
        registry(),
    );
    other.initialize().await.unwrap();
    let stats = other.get_stats().await;
    assert!(!stats.loaded_from_cache);
    assert_eq!(stats.dimension, Some(128));
    assert_eq!(stats.model_id, "hashing-128");

    // The other engine overwrote the cache for its own model
    let validation = other.validate_cache().await.unwrap();
    assert!(validation.valid);
    let fresh = harness.engine(config, points_catalog(), registry());
    let validation = fresh.validate_cache().await.unwrap();
    assert!(!validation.valid);
    assert!(validation.reason.is_some());
}

/// Editing any checksummed field forces a re-embed on the next start.
#[tokio::test]
async fn test_tampered_cache_is_rebuilt() {
    let harness = TestHarness::new();
    let config = harness.config(Metric::Cosine);
    let mut first = harness
        .ready_engine(config.clone(), points_catalog(), registry())
        .await;
    first.dispose().await;

    tamper_first_timestamp(&harness).await;

    let second = harness
        .ready_engine(config.clone(), points_catalog(), registry())
        .await;
    assert!(!second.get_stats().await.loaded_from_cache);
    assert_eq!(harness.counters.batch_texts(), 8);

    // The rebuild wrote a fresh, valid cache
    assert!(second.validate_cache().await.unwrap().valid);
}

/// A catalog edit between runs discards the cached vectors.
#[tokio::test]
async fn test_catalog_change_invalidates_cache() {
    let harness = TestHarness::new();
    let config = harness.config(Metric::Cosine);
    harness
        .ready_engine(config.clone(), points_catalog(), registry())
        .await;

    let mut catalog = points_catalog();
    catalog.add_template(
        Template::new("weather", "getWeather", "misc")
            .with_phrases(Language::En, ["weather forecast tomorrow"]),
    );
    let engine = harness.ready_engine(config, catalog, registry()).await;

    let stats = engine.get_stats().await;
    assert!(!stats.loaded_from_cache);
    assert_eq!(stats.indexed_intents, 5);
    assert_eq!(harness.counters.batch_texts(), 4 + 5);
}

/// clearCache removes the files but leaves the live index answering.
#[tokio::test]
async fn test_clear_cache_keeps_index() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(harness.config(Metric::Cosine), points_catalog(), registry())
        .await;
    assert!(engine.get_stats().await.cache.unwrap().exists);

    engine.clear_cache().await.unwrap();
    engine.clear_cache().await.unwrap();

    let stats = engine.get_stats().await;
    assert!(!stats.cache.unwrap().exists);
    assert!(engine.query("check points").await.unwrap().success);
}

/// Save then load returns the same items, matched up by id.
#[tokio::test]
async fn test_cache_round_trip_by_id() {
    let harness = TestHarness::new();
    let cache = EmbeddingCache::new(&harness.cache_dir, ONE_HOUR_MS);
    let mut provider = HashingEmbedder::new(64);
    provider.initialize().await.unwrap();

    let intents = points_catalog().get_all_flattened();
    let mut items = Vec::new();
    for intent in intents {
        let vector = provider.embed(&intent.text).await.unwrap().into_values();
        items.push(CacheItem::new(intent, vector));
    }
    cache.save(&items, provider.model_id(), 64).await.unwrap();

    let loaded = cache.load(provider.model_id(), 64).await.unwrap();
    let by_id: HashMap<u64, CacheItem> = loaded
        .into_iter()
        .map(|item| (item.intent.id, item))
        .collect();
    assert_eq!(by_id.len(), items.len());
    for item in &items {
        assert_eq!(by_id.get(&item.intent.id), Some(item));
    }

    assert!(cache.load("hashing-128", 64).await.is_none());
    assert!(cache.load(provider.model_id(), 65).await.is_none());
}

/// An engine without a cache directory never touches the disk.
#[tokio::test]
async fn test_cache_disabled() {
    let harness = TestHarness::new();
    let mut config = harness.config(Metric::Cosine);
    config.cache_dir = None;

    let mut engine = harness.ready_engine(config, points_catalog(), registry()).await;
    assert!(engine.validate_cache().await.is_none());
    assert!(engine.get_stats().await.cache.is_none());
    assert!(!harness.cache_dir.exists());

    engine.dispose().await;
    engine.dispose().await;
    assert_eq!(engine.state(), EngineState::Disposed);
    assert_eq!(harness.counters.disposes(), 1);
}
