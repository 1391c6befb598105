//! End-to-end test infrastructure for the intent router.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full catalog-to-answer pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use intent_embeddings::{Embedding, EmbeddingError, EmbeddingProvider, HashingEmbedder, ModelInfo};
use intent_retrieval::{ActionRegistry, EngineConfig, RetrievalEngine, TemplateCatalog};
use intent_types::{IndexBackend, Language, Metric, Template};
use intent_vector::IndexConfig;

/// Call counters shared between a [`CountingProvider`] and the test.
#[derive(Debug, Default)]
pub struct ProviderCounters {
    /// Single-text `embed` calls (one per non-empty query)
    pub embeds: AtomicUsize,
    /// Texts passed through `embed_batch` (catalog embedding)
    pub batch_texts: AtomicUsize,
    pub initializes: AtomicUsize,
    pub disposes: AtomicUsize,
    /// When set, `embed` fails
    pub fail_embed: AtomicBool,
}

impl ProviderCounters {
    pub fn embeds(&self) -> usize {
        self.embeds.load(Ordering::SeqCst)
    }

    pub fn batch_texts(&self) -> usize {
        self.batch_texts.load(Ordering::SeqCst)
    }

    pub fn disposes(&self) -> usize {
        self.disposes.load(Ordering::SeqCst)
    }

    pub fn set_fail_embed(&self, fail: bool) {
        self.fail_embed.store(fail, Ordering::SeqCst);
    }
}

/// Hashing provider that records how often it is called.
pub struct CountingProvider {
    inner: HashingEmbedder,
    counters: Arc<ProviderCounters>,
}

impl CountingProvider {
    pub fn new(counters: Arc<ProviderCounters>) -> Self {
        Self {
            inner: HashingEmbedder::default(),
            counters,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn initialize(&mut self) -> Result<(), EmbeddingError> {
        self.counters.initializes.fetch_add(1, Ordering::SeqCst);
        self.inner.initialize().await
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    fn info(&self) -> &ModelInfo {
        self.inner.info()
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.counters.embeds.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_embed.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Io(std::io::Error::other("injected failure")));
        }
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.counters
            .batch_texts
            .fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    async fn dispose(&mut self) {
        self.counters.disposes.fetch_add(1, Ordering::SeqCst);
        self.inner.dispose().await;
    }
}

/// Shared test harness for E2E tests.
///
/// Owns a temp cache directory and the counters of every provider it
/// hands out, so several engines built from one harness share a cache.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Embedding cache directory
    pub cache_dir: PathBuf,
    /// Counters for providers created by this harness
    pub counters: Arc<ProviderCounters>,
}

impl TestHarness {
    /// Create a new test harness with a temp cache directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let cache_dir = temp_dir.path().join("embedding-cache");

        Self {
            _temp_dir: temp_dir,
            cache_dir,
            counters: Arc::new(ProviderCounters::default()),
        }
    }

    /// Engine config using the exact backend and the harness cache.
    pub fn config(&self, metric: Metric) -> EngineConfig {
        EngineConfig {
            index: IndexConfig::new(metric, IndexBackend::Exact),
            cache_dir: Some(self.cache_dir.clone()),
            ..Default::default()
        }
    }

    /// A counting provider wired to the harness counters.
    pub fn provider(&self) -> Box<dyn EmbeddingProvider> {
        Box::new(CountingProvider::new(Arc::clone(&self.counters)))
    }

    /// Build an uninitialized engine.
    pub fn engine(
        &self,
        config: EngineConfig,
        catalog: TemplateCatalog,
        registry: ActionRegistry,
    ) -> RetrievalEngine {
        RetrievalEngine::new(config, self.provider(), catalog, registry)
    }

    /// Build and initialize an engine.
    pub async fn ready_engine(
        &self,
        config: EngineConfig,
        catalog: TemplateCatalog,
        registry: ActionRegistry,
    ) -> RetrievalEngine {
        let mut engine = self.engine(config, catalog, registry);
        engine
            .initialize()
            .await
            .expect("Failed to initialize engine");
        engine
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Small two-template catalog used by most scenarios.
pub fn points_catalog() -> TemplateCatalog {
    TemplateCatalog::from_templates([
        Template::new("points", "getUserPoints", "user")
            .with_phrases(Language::En, ["check points"])
            .with_phrases(Language::Zh, ["查询积分"]),
        Template::new("devices", "listDevices", "device")
            .with_phrases(Language::En, ["list all devices"])
            .with_phrases(Language::Zh, ["显示所有设备"]),
    ])
}

/// Registry answering the points catalog, counting handler invocations.
pub fn counting_registry(calls: Arc<AtomicUsize>) -> ActionRegistry {
    let points_calls = Arc::clone(&calls);
    ActionRegistry::builder()
        .action("getUserPoints", move || {
            points_calls.fetch_add(1, Ordering::SeqCst);
            "You have 120 points".to_string()
        })
        .action("listDevices", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            "No devices".to_string()
        })
        .build()
}
