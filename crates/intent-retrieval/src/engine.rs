//! Retrieval engine.
//!
//! Orchestrates one query end to end:
//!
//! ```text
//! Idle -> DetectLanguage -> Embed -> PrimarySearch -> Matched | NoMatch
//! NoMatch (fuzzy enabled) -> FuzzySearch -> FuzzyMatched | Unmatched
//! all paths -> Respond
//! ```
//!
//! The engine owns the embedding provider and the intent index for its
//! whole lifetime and releases both in [`RetrievalEngine::dispose`]. The
//! embedding cache is consulted only during initialization.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use intent_cache::{CacheItem, CacheValidation, EmbeddingCache};
use intent_embeddings::EmbeddingProvider;
use intent_types::{Intent, Language, MatchSettings, Settings, Template};
use intent_vector::{IndexConfig, IntentIndex};
use tracing::{debug, info, warn};

use crate::catalog::TemplateCatalog;
use crate::detector::LanguageDetector;
use crate::dispatch::{ActionDispatcher, ActionRegistry};
use crate::error::EngineError;
use crate::messages;
use crate::types::{EngineState, EngineStats, QueryResult, Suggestion};

/// Engine configuration, usually derived from [`Settings`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub matching: MatchSettings,
    pub index: IndexConfig,
    /// Cache directory; `None` disables the embedding cache
    pub cache_dir: Option<PathBuf>,
    pub max_cache_age_ms: i64,
    /// Detection memo capacity; 0 disables memoization
    pub memo_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matching: MatchSettings::default(),
            index: IndexConfig::default(),
            cache_dir: None,
            max_cache_age_ms: 7 * 24 * 3_600_000,
            memo_capacity: 1024,
        }
    }
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            matching: settings.matching.clone(),
            index: IndexConfig::from(&settings.index),
            cache_dir: settings
                .cache
                .enabled
                .then(|| settings.expanded_cache_dir()),
            max_cache_age_ms: settings.max_cache_age_ms(),
            memo_capacity: settings.detection.memo_capacity,
        }
    }
}

fn init_error(stage: &str, err: impl fmt::Display) -> EngineError {
    EngineError::Initialization(format!("{}: {}", stage, err))
}

/// Maps free-form utterances onto catalog actions.
pub struct RetrievalEngine {
    config: EngineConfig,
    provider: Box<dyn EmbeddingProvider>,
    index: IntentIndex,
    catalog: TemplateCatalog,
    detector: LanguageDetector,
    dispatcher: ActionDispatcher,
    cache: Option<EmbeddingCache>,
    state: EngineState,
    detected_language: Option<Language>,
    loaded_from_cache: bool,
    queries_served: u64,
}

impl RetrievalEngine {
    /// Create an engine. Nothing is loaded until [`RetrievalEngine::initialize`].
    pub fn new(
        config: EngineConfig,
        provider: Box<dyn EmbeddingProvider>,
        catalog: TemplateCatalog,
        registry: impl Into<Arc<ActionRegistry>>,
    ) -> Self {
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| EmbeddingCache::new(dir.clone(), config.max_cache_age_ms));
        Self {
            index: IntentIndex::new(config.index.clone()),
            detector: LanguageDetector::new(config.memo_capacity),
            dispatcher: ActionDispatcher::new(registry.into()),
            config,
            provider,
            catalog,
            cache,
            state: EngineState::Uninitialized,
            detected_language: None,
            loaded_from_cache: false,
            queries_served: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Load the provider, then fill the index from the cache or by
    /// embedding every catalog phrase. Calling on a ready engine is a no-op.
    pub async fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Ready {
            debug!("Engine already initialized");
            return Ok(());
        }
        let start = Instant::now();

        self.config
            .matching
            .validate()
            .map_err(|e| init_error("matching settings", e))?;

        self.provider
            .initialize()
            .await
            .map_err(|e| init_error("embedding provider", e))?;
        let dimension = self.provider.dimension();
        let model_id = self.provider.model_id().to_string();

        self.index.dispose();
        self.index
            .initialize(dimension)
            .map_err(|e| init_error("vector index", e))?;

        let intents = self.catalog.get_all_flattened();
        let (items, from_cache) = match self.load_cached(&intents, &model_id, dimension).await {
            Some(items) => (items, true),
            None => (self.embed_catalog(intents, &model_id, dimension).await?, false),
        };

        let pairs = items
            .into_iter()
            .map(|item| (item.intent, item.vector))
            .collect();
        self.index
            .add_batch(pairs)
            .map_err(|e| init_error("vector index", e))?;

        self.loaded_from_cache = from_cache;
        self.state = EngineState::Ready;
        info!(
            model = %model_id,
            dim = dimension,
            intents = self.index.len(),
            from_cache = from_cache,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieval engine ready"
        );
        Ok(())
    }

    /// Cached items, in catalog order, if the cache is valid and holds
    /// exactly the current catalog. Anything else is a miss.
    async fn load_cached(
        &self,
        intents: &[Intent],
        model_id: &str,
        dimension: usize,
    ) -> Option<Vec<CacheItem>> {
        let cache = self.cache.as_ref()?;
        let cached = cache.load(model_id, dimension).await?;
        if cached.len() != intents.len() {
            debug!(
                cached = cached.len(),
                catalog = intents.len(),
                "Cached intents differ from catalog"
            );
            return None;
        }

        let mut by_id: HashMap<u64, CacheItem> = cached
            .into_iter()
            .map(|item| (item.intent.id, item))
            .collect();
        let mut ordered = Vec::with_capacity(intents.len());
        for intent in intents {
            match by_id.remove(&intent.id) {
                Some(item) if item.intent == *intent => ordered.push(item),
                _ => {
                    debug!(id = intent.id, "Cached intents differ from catalog");
                    return None;
                }
            }
        }
        Some(ordered)
    }

    /// Embed every intent and persist the result. A failed save is logged
    /// and otherwise ignored.
    async fn embed_catalog(
        &self,
        intents: Vec<Intent>,
        model_id: &str,
        dimension: usize,
    ) -> Result<Vec<CacheItem>, EngineError> {
        info!(intents = intents.len(), "Embedding catalog");
        let texts: Vec<&str> = intents.iter().map(|i| i.text.as_str()).collect();
        let embeddings = self
            .provider
            .embed_batch(&texts)
            .await
            .map_err(|e| init_error("embedding catalog", e))?;

        let items: Vec<CacheItem> = intents
            .into_iter()
            .zip(embeddings)
            .map(|(intent, embedding)| CacheItem::new(intent, embedding.into_values()))
            .collect();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&items, model_id, dimension).await {
                warn!(error = %e, "Failed to save embedding cache");
            }
        }
        Ok(items)
    }

    /// Answer one utterance.
    ///
    /// Returns `Err` only when the engine is not initialized. Every other
    /// failure becomes an unsuccessful [`QueryResult`] with a localized message.
    pub async fn query(&mut self, text: &str) -> Result<QueryResult, EngineError> {
        if self.state != EngineState::Ready {
            return Err(EngineError::NotInitialized);
        }
        let start = Instant::now();
        self.queries_served += 1;

        let result = if text.trim().is_empty() {
            let language = self.detected_language.unwrap_or_default();
            QueryResult::failure(messages::empty_input(language), language)
        } else {
            let language = self.detector.detect(text).language;
            self.detected_language = Some(language);
            match self.run_query(text, language).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "Query failed");
                    QueryResult::failure(messages::query_failed(language), language)
                }
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(success = result.success, elapsed_ms = elapsed_ms, "Query complete");
        Ok(result.with_elapsed(elapsed_ms))
    }

    async fn run_query(&self, text: &str, language: Language) -> Result<QueryResult, EngineError> {
        let metric = self.index.metric();
        let matching = &self.config.matching;

        // Computed once; the fuzzy retry reuses it
        let vector = self.provider.embed(text).await?.into_values();

        let primary = self.index.search(
            &vector,
            matching.primary_k,
            Some(matching.threshold(metric)),
        )?;
        if let Some(best) = primary.into_iter().next() {
            let outcome = self.dispatcher.dispatch(&best.intent.action, text, language);
            info!(
                action = %best.intent.action,
                score = best.score,
                executed = outcome.executed,
                "Matched intent"
            );
            return Ok(QueryResult::matched(
                outcome.response,
                language,
                best.intent,
                best.score,
                outcome.executed,
            ));
        }

        if matching.fuzzy_enabled {
            let fuzzy = self
                .index
                .search(&vector, 1, Some(matching.fuzzy_threshold(metric)))?;
            if let Some(candidate) = fuzzy.into_iter().next() {
                debug!(
                    action = %candidate.intent.action,
                    score = candidate.score,
                    "Fuzzy suggestion"
                );
                let response = messages::fuzzy_suggestion(language, &candidate.intent.text);
                return Ok(QueryResult::suggested(
                    response,
                    language,
                    Suggestion {
                        text: candidate.intent.text,
                        action: candidate.intent.action,
                        score: candidate.score,
                    },
                ));
            }
        }

        debug!("No intent matched");
        Ok(QueryResult::failure(messages::not_understood(language), language))
    }

    /// Add or replace a template in the catalog.
    ///
    /// The live index is not touched: new phrases only become matchable
    /// after [`RetrievalEngine::reinitialize`].
    pub fn add_template(&mut self, template: Template) -> bool {
        info!(id = %template.id, "Template added; reinitialize to index it");
        self.catalog.add_template(template)
    }

    /// Remove a template from the catalog. Like `add_template`, the live
    /// index keeps serving the old phrases until reinitialized.
    pub fn remove_template(&mut self, id: &str) -> bool {
        self.catalog.remove_template(id)
    }

    /// Rebuild the index from the current catalog, recomputing embeddings
    /// unless the cache already holds exactly this catalog.
    pub async fn reinitialize(&mut self) -> Result<(), EngineError> {
        info!("Reinitializing retrieval engine");
        self.state = EngineState::Uninitialized;
        self.index.dispose();
        self.initialize().await
    }

    /// Release the provider and the index. Safe to call repeatedly and on
    /// an engine that never finished initializing.
    pub async fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.provider.dispose().await;
        self.index.dispose();
        self.state = EngineState::Disposed;
        info!("Disposed retrieval engine");
    }

    /// Remove the on-disk embedding cache. The live index is unaffected.
    pub async fn clear_cache(&self) -> Result<(), EngineError> {
        if let Some(cache) = &self.cache {
            cache.clear_cache().await?;
        }
        Ok(())
    }

    /// Run the cache validation sequence against the current provider.
    pub async fn validate_cache(&self) -> Option<CacheValidation> {
        let cache = self.cache.as_ref()?;
        Some(
            cache
                .validate_cache(self.provider.model_id(), self.provider.dimension())
                .await,
        )
    }

    /// Language of the most recent non-empty query, English before any.
    pub fn get_detected_language(&self) -> Language {
        self.detected_language.unwrap_or_default()
    }

    pub async fn get_stats(&self) -> EngineStats {
        let cache = match &self.cache {
            Some(cache) => Some(cache.get_cache_stats().await),
            None => None,
        };
        EngineStats {
            state: self.state,
            templates: self.catalog.len(),
            catalog_intents: self.catalog.intent_count(),
            indexed_intents: self.index.len(),
            model_id: self.provider.model_id().to_string(),
            dimension: self.index.dimension(),
            metric: self.index.metric().as_str(),
            loaded_from_cache: self.loaded_from_cache,
            queries_served: self.queries_served,
            index: self.index.stats(),
            cache,
            detection_memo_entries: self.detector.memo_len(),
            actions: self.dispatcher.registry().len(),
        }
    }
}
