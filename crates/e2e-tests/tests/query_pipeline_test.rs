//! Query pipeline E2E tests for the intent router.
//!
//! Drives the full path: language detection, one embedding per query,
//! primary search, fuzzy retry, and action dispatch. The counting provider
//! and index statistics prove how much work each query actually did.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{counting_registry, points_catalog, TestHarness};
use intent_retrieval::{messages, EngineError, EngineState};
use intent_types::{Language, Metric, Template};

// ===== Empty input =====

/// Blank queries never reach the provider or the index.
#[tokio::test]
async fn test_blank_input_skips_embedding_and_search() {
    let harness = TestHarness::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Cosine),
            points_catalog(),
            counting_registry(calls.clone()),
        )
        .await;

    for text in ["", "   ", "\t\n"] {
        let result = engine.query(text).await.unwrap();
        assert!(!result.success, "blank input {:?} must fail", text);
        assert!(!result.response.is_empty());
        assert_eq!(result.response, messages::empty_input(Language::En));
        assert!(result.matched_intent.is_none());
    }

    let stats = engine.get_stats().await;
    assert_eq!(harness.counters.embeds(), 0);
    assert_eq!(stats.index.searches, 0);
    assert_eq!(stats.queries_served, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ===== Primary match =====

/// A close paraphrase clears the default 0.65 cosine threshold.
#[tokio::test]
async fn test_paraphrase_matches_get_user_points() {
    let harness = TestHarness::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = harness.config(Metric::Cosine);
    config.matching.cosine_threshold = 0.65;
    let mut engine = harness
        .ready_engine(config, points_catalog(), counting_registry(calls.clone()))
        .await;

    let result = engine.query("check my points").await.unwrap();

    assert!(result.success);
    assert_eq!(result.matched_intent.unwrap().action, "getUserPoints");
    assert!(result.confidence.unwrap() >= 0.65);
    assert!(result.action_executed);
    assert_eq!(result.response, "You have 120 points");
    assert_eq!(result.language, Language::En);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.counters.embeds(), 1);
    assert_eq!(engine.get_stats().await.index.searches, 1);
}

/// Chinese input is answered and the detected language is remembered.
#[tokio::test]
async fn test_chinese_query_sets_detected_language() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Cosine),
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    let result = engine.query("查询积分").await.unwrap();
    assert!(result.success);
    assert_eq!(result.language, Language::Zh);
    assert_eq!(engine.get_detected_language(), Language::Zh);

    // Empty input answers in the last detected language
    let result = engine.query("  ").await.unwrap();
    assert_eq!(result.language, Language::Zh);
    assert_eq!(result.response, messages::empty_input(Language::Zh));
}

/// Exact phrases also match through the euclidean score transform.
#[tokio::test]
async fn test_euclidean_metric_matches_exact_phrase() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Euclidean),
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    let result = engine.query("list all devices").await.unwrap();
    assert!(result.success);
    assert_eq!(result.matched_intent.unwrap().action, "listDevices");
    assert!((result.confidence.unwrap() - 1.0).abs() < 1e-4);
}

// ===== Fuzzy retry =====

/// A miss on the primary threshold costs one more search and no embedding.
#[tokio::test]
async fn test_fuzzy_retry_is_one_extra_search() {
    let harness = TestHarness::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = harness.config(Metric::Cosine);
    config.matching.cosine_threshold = 0.95;
    config.matching.fuzzy_cosine_threshold = 0.3;
    let mut engine = harness
        .ready_engine(config, points_catalog(), counting_registry(calls.clone()))
        .await;

    let result = engine.query("check my points").await.unwrap();

    assert!(!result.success);
    let suggestion = result.suggestion.expect("expected a fuzzy suggestion");
    assert_eq!(suggestion.action, "getUserPoints");
    assert_eq!(suggestion.text, "check points");
    assert_eq!(
        result.response,
        messages::fuzzy_suggestion(Language::En, "check points")
    );
    assert_eq!(harness.counters.embeds(), 1);
    assert_eq!(engine.get_stats().await.index.searches, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "suggestions never dispatch");
}

/// When the fuzzy search also finds nothing the generic message is used.
#[tokio::test]
async fn test_fuzzy_miss_is_not_understood() {
    let harness = TestHarness::new();
    let mut config = harness.config(Metric::Cosine);
    config.matching.cosine_threshold = 0.95;
    config.matching.fuzzy_cosine_threshold = 0.9;
    let mut engine = harness
        .ready_engine(
            config,
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    let result = engine.query("weather tomorrow afternoon").await.unwrap();

    assert!(!result.success);
    assert!(result.suggestion.is_none());
    assert_eq!(result.response, messages::not_understood(Language::En));
    assert_eq!(harness.counters.embeds(), 1);
    assert_eq!(engine.get_stats().await.index.searches, 2);
}

/// With fuzzy matching off a primary miss is a single search.
#[tokio::test]
async fn test_fuzzy_disabled_skips_retry() {
    let harness = TestHarness::new();
    let mut config = harness.config(Metric::Cosine);
    config.matching.cosine_threshold = 0.95;
    config.matching.fuzzy_enabled = false;
    let mut engine = harness
        .ready_engine(
            config,
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    let result = engine.query("check my points").await.unwrap();
    assert!(!result.success);
    assert!(result.suggestion.is_none());
    assert_eq!(engine.get_stats().await.index.searches, 1);
}

// ===== Failures =====

/// A provider failure during a query becomes a localized failed result.
#[tokio::test]
async fn test_embedding_failure_is_reported_not_raised() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Cosine),
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    harness.counters.set_fail_embed(true);
    let result = engine.query("check points").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.response, messages::query_failed(Language::En));

    harness.counters.set_fail_embed(false);
    let result = engine.query("check points").await.unwrap();
    assert!(result.success);
}

/// Queries before initialize or after dispose are rejected.
#[tokio::test]
async fn test_query_outside_ready_state() {
    let harness = TestHarness::new();
    let mut engine = harness.engine(
        harness.config(Metric::Cosine),
        points_catalog(),
        counting_registry(Arc::new(AtomicUsize::new(0))),
    );

    assert!(matches!(
        engine.query("check points").await,
        Err(EngineError::NotInitialized)
    ));

    engine.initialize().await.unwrap();
    assert!(engine.query("check points").await.is_ok());

    engine.dispose().await;
    assert_eq!(engine.state(), EngineState::Disposed);
    assert!(matches!(
        engine.query("check points").await,
        Err(EngineError::NotInitialized)
    ));
}

// ===== Catalog changes =====

/// New templates are invisible to queries until the engine reinitializes.
#[tokio::test]
async fn test_add_template_is_not_retroactive() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Cosine),
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    engine.add_template(
        Template::new("weather", "getWeather", "misc")
            .with_phrases(Language::En, ["weather forecast tomorrow"]),
    );
    let stats = engine.get_stats().await;
    assert_eq!(stats.catalog_intents, 5);
    assert_eq!(stats.indexed_intents, 4);

    let before = engine.query("weather forecast tomorrow").await.unwrap();
    assert!(!before.success);

    engine.reinitialize().await.unwrap();
    let after = engine.query("weather forecast tomorrow").await.unwrap();
    assert!(after.success);
    assert_eq!(after.matched_intent.unwrap().action, "getWeather");
    // No handler registered: matched but not executed
    assert!(!after.action_executed);
    assert_eq!(
        after.response,
        messages::not_implemented(Language::En, "getWeather")
    );
}

/// Removing a template drops its phrases after reinitialize.
#[tokio::test]
async fn test_remove_template_then_reinitialize() {
    let harness = TestHarness::new();
    let mut engine = harness
        .ready_engine(
            harness.config(Metric::Cosine),
            points_catalog(),
            counting_registry(Arc::new(AtomicUsize::new(0))),
        )
        .await;

    assert!(engine.remove_template("devices"));
    assert!(!engine.remove_template("devices"));

    assert!(engine.query("list all devices").await.unwrap().success);
    engine.reinitialize().await.unwrap();

    let result = engine.query("list all devices").await.unwrap();
    assert!(result.matched_intent.is_none());
    assert_eq!(engine.get_stats().await.indexed_intents, 2);
}
