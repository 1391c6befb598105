//! Intent index: the uniform contract over a nearest-neighbor backend.
//!
//! Owns intent bookkeeping, sequential labels, dimension checks, the
//! metric-dependent score transform and the score threshold. Labels are
//! 0-based in insertion order; there is no per-item removal, only `clear`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use intent_types::{IndexBackend, IndexSettings, Intent, Metric};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::NeighborBackend;
use crate::error::VectorError;
use crate::exact::ExactBackend;
use crate::hnsw::{HnswBackend, HnswConfig};
use crate::score::ScoreTransform;

/// Extra candidates requested from approximate backends so that score
/// ties at the cut-off still resolve to the earliest label.
const TIE_SLACK: usize = 4;

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub metric: Metric,
    pub backend: IndexBackend,
    pub euclidean_scale: f32,
    pub hnsw: HnswConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            backend: IndexBackend::Hnsw,
            euclidean_scale: 1.0,
            hnsw: HnswConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new(metric: Metric, backend: IndexBackend) -> Self {
        Self {
            metric,
            backend,
            ..Default::default()
        }
    }

    pub fn with_euclidean_scale(mut self, scale: f32) -> Self {
        self.euclidean_scale = scale;
        self
    }
}

impl From<&IndexSettings> for IndexConfig {
    fn from(settings: &IndexSettings) -> Self {
        Self {
            metric: settings.metric,
            backend: settings.backend,
            euclidean_scale: settings.euclidean_scale,
            hnsw: HnswConfig::from(settings),
        }
    }
}

/// Result of an intent search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub intent: Intent,
    /// Similarity, higher = better; scale depends on metric
    pub score: f32,
    /// Metric distance, lower = better
    pub distance: f32,
    /// Insertion label
    pub label: u64,
}

/// Index statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub initialized: bool,
    pub vector_count: usize,
    pub dimension: Option<usize>,
    pub metric: Option<&'static str>,
    /// Number of `search` calls served since creation
    pub searches: u64,
}

struct LiveIndex {
    dimension: usize,
    backend: Box<dyn NeighborBackend>,
    /// Indexed by label
    intents: Vec<Intent>,
    /// Stored vectors, by label; used to roll back a failed batch
    vectors: Vec<Vec<f32>>,
    ids: HashSet<u64>,
}

impl LiveIndex {
    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn push(&mut self, intent: Intent, vector: Vec<f32>) -> Result<u64, VectorError> {
        let label = self.intents.len() as u64;
        self.backend.add(label, &vector)?;
        self.ids.insert(intent.id);
        self.intents.push(intent);
        self.vectors.push(vector);
        Ok(label)
    }

    /// Restore the backend to the first `keep` entries.
    fn truncate(&mut self, keep: usize) -> Result<(), VectorError> {
        for intent in self.intents.drain(keep..) {
            self.ids.remove(&intent.id);
        }
        self.vectors.truncate(keep);
        self.backend.clear()?;
        for (label, vector) in self.vectors.iter().enumerate() {
            self.backend.add(label as u64, vector)?;
        }
        Ok(())
    }
}

/// Vector index over intents.
pub struct IntentIndex {
    config: IndexConfig,
    transform: ScoreTransform,
    live: Option<LiveIndex>,
    searches: AtomicU64,
}

impl IntentIndex {
    /// Create an uninitialized index. Call [`IntentIndex::initialize`] before use.
    pub fn new(config: IndexConfig) -> Self {
        let transform = ScoreTransform::new(config.metric, config.euclidean_scale);
        Self {
            config,
            transform,
            live: None,
            searches: AtomicU64::new(0),
        }
    }

    /// Fix the dimension and create the backend.
    pub fn initialize(&mut self, dimension: usize) -> Result<(), VectorError> {
        if let Some(live) = &self.live {
            return Err(VectorError::AlreadyInitialized(live.dimension));
        }
        if dimension == 0 {
            return Err(VectorError::InvalidDimension(dimension));
        }

        let backend: Box<dyn NeighborBackend> = match self.config.backend {
            IndexBackend::Hnsw => Box::new(HnswBackend::new(
                dimension,
                self.config.metric,
                self.config.hnsw.clone(),
            )?),
            IndexBackend::Exact => Box::new(ExactBackend::new(dimension, self.config.metric)),
        };

        self.live = Some(LiveIndex {
            dimension,
            backend,
            intents: Vec::new(),
            vectors: Vec::new(),
            ids: HashSet::new(),
        });
        info!(
            dim = dimension,
            metric = self.config.metric.as_str(),
            backend = ?self.config.backend,
            "Initialized intent index"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn transform(&self) -> &ScoreTransform {
        &self.transform
    }

    pub fn dimension(&self) -> Option<usize> {
        self.live.as_ref().map(|live| live.dimension)
    }

    pub fn len(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.intents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, intent_id: u64) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.ids.contains(&intent_id))
    }

    /// Intent stored under a label
    pub fn intent(&self, label: u64) -> Option<&Intent> {
        self.live
            .as_ref()
            .and_then(|live| live.intents.get(label as usize))
    }

    fn live(&self) -> Result<&LiveIndex, VectorError> {
        self.live.as_ref().ok_or(VectorError::NotInitialized)
    }

    fn live_mut(&mut self) -> Result<&mut LiveIndex, VectorError> {
        self.live.as_mut().ok_or(VectorError::NotInitialized)
    }

    /// Add one intent; returns its label.
    pub fn add(&mut self, intent: Intent, vector: &[f32]) -> Result<u64, VectorError> {
        let prepared = self.transform.prepare(vector);
        let live = self.live_mut()?;
        live.check_dimension(vector)?;
        if live.ids.contains(&intent.id) {
            return Err(VectorError::DuplicateIntent(intent.id));
        }

        let label = live.push(intent, prepared)?;
        debug!(label = label, "Added intent vector");
        Ok(label)
    }

    /// Add many intents, all or nothing. Returns the assigned labels.
    pub fn add_batch(&mut self, pairs: Vec<(Intent, Vec<f32>)>) -> Result<Vec<u64>, VectorError> {
        let transform = self.transform;
        let live = self.live_mut()?;

        let mut batch_ids = HashSet::with_capacity(pairs.len());
        for (intent, vector) in &pairs {
            live.check_dimension(vector)?;
            if live.ids.contains(&intent.id) || !batch_ids.insert(intent.id) {
                return Err(VectorError::DuplicateIntent(intent.id));
            }
        }

        let keep = live.intents.len();
        let mut labels = Vec::with_capacity(pairs.len());
        for (intent, vector) in pairs {
            match live.push(intent, transform.prepare(&vector)) {
                Ok(label) => labels.push(label),
                Err(e) => {
                    warn!(error = %e, "Backend rejected batch, rolling back");
                    live.truncate(keep)?;
                    return Err(e);
                }
            }
        }

        info!(count = labels.len(), total = live.intents.len(), "Indexed intent batch");
        Ok(labels)
    }

    /// Up to `k` results, best score first, ties by ascending label.
    /// Results scoring below `score_threshold` are dropped.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>, VectorError> {
        let live = self.live()?;
        live.check_dimension(query)?;
        self.searches.fetch_add(1, Ordering::Relaxed);

        if k == 0 || live.intents.is_empty() {
            return Ok(vec![]);
        }

        let query = self.transform.prepare(query);
        let fetch = (k + TIE_SLACK).min(live.intents.len());
        let neighbors = live.backend.search(&query, fetch)?;

        let mut results: Vec<SearchResult> = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let intent = live.intents.get(neighbor.label as usize)?;
                Some(SearchResult {
                    intent: intent.clone(),
                    score: self.transform.score(neighbor.raw),
                    distance: self.transform.distance(neighbor.raw),
                    label: neighbor.label,
                })
            })
            .filter(|result| score_threshold.is_none_or(|t| result.score >= t))
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.label.cmp(&b.label)));
        results.truncate(k);

        debug!(k = k, found = results.len(), "Search complete");
        Ok(results)
    }

    /// Remove every intent, keeping the dimension. Labels restart at 0.
    pub fn clear(&mut self) -> Result<(), VectorError> {
        let live = self.live_mut()?;
        live.backend.clear()?;
        live.intents.clear();
        live.vectors.clear();
        live.ids.clear();
        info!("Cleared intent index");
        Ok(())
    }

    /// Release the backend. The index returns to the uninitialized state.
    pub fn dispose(&mut self) {
        if self.live.take().is_some() {
            debug!("Disposed intent index");
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            initialized: self.live.is_some(),
            vector_count: self.len(),
            dimension: self.dimension(),
            metric: self.live.as_ref().map(|_| self.config.metric.as_str()),
            searches: self.searches.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_embeddings::normalize;

    fn intent(id: u64, text: &str) -> Intent {
        Intent::new(id, text, format!("action{}", id))
    }

    fn exact(metric: Metric) -> IntentIndex {
        let mut index = IntentIndex::new(IndexConfig::new(metric, IndexBackend::Exact));
        index.initialize(3).unwrap();
        index
    }

    fn random_unit(dim: usize) -> Vec<f32> {
        use rand::Rng;
        let mut rng = rand::rng();
        normalize((0..dim).map(|_| rng.random::<f32>() - 0.5).collect())
    }

    #[test]
    fn test_uninitialized_access() {
        let mut index = IntentIndex::new(IndexConfig::default());
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 3, None),
            Err(VectorError::NotInitialized)
        ));
        assert!(matches!(
            index.add(intent(0, "a"), &[1.0, 0.0, 0.0]),
            Err(VectorError::NotInitialized)
        ));
        assert!(matches!(index.clear(), Err(VectorError::NotInitialized)));
        assert!(!index.stats().initialized);
    }

    #[test]
    fn test_initialize_once() {
        let mut index = exact(Metric::Cosine);
        assert!(matches!(
            index.initialize(3),
            Err(VectorError::AlreadyInitialized(3))
        ));

        let mut fresh = IntentIndex::new(IndexConfig::default());
        assert!(matches!(
            fresh.initialize(0),
            Err(VectorError::InvalidDimension(0))
        ));
    }

    #[test]
    fn test_sequential_labels() {
        let mut index = exact(Metric::Cosine);
        assert_eq!(index.add(intent(10, "a"), &[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.add(intent(11, "b"), &[0.0, 1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.intent(1).unwrap().id, 11);
        assert!(index.contains(10));
    }

    #[test]
    fn test_add_rejects_mismatch_and_duplicates() {
        let mut index = exact(Metric::Cosine);
        assert!(matches!(
            index.add(intent(0, "a"), &[1.0, 0.0]),
            Err(VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));

        index.add(intent(0, "a"), &[1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            index.add(intent(0, "again"), &[0.0, 1.0, 0.0]),
            Err(VectorError::DuplicateIntent(0))
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_add_batch_all_or_nothing() {
        let mut index = exact(Metric::Cosine);
        index.add(intent(0, "a"), &[1.0, 0.0, 0.0]).unwrap();

        let bad_dim = vec![
            (intent(1, "b"), vec![0.0, 1.0, 0.0]),
            (intent(2, "c"), vec![0.0, 1.0]),
        ];
        assert!(index.add_batch(bad_dim).is_err());
        assert_eq!(index.len(), 1);

        let dup_existing = vec![
            (intent(1, "b"), vec![0.0, 1.0, 0.0]),
            (intent(0, "a"), vec![0.0, 0.0, 1.0]),
        ];
        assert!(matches!(
            index.add_batch(dup_existing),
            Err(VectorError::DuplicateIntent(0))
        ));

        let dup_within = vec![
            (intent(1, "b"), vec![0.0, 1.0, 0.0]),
            (intent(1, "b2"), vec![0.0, 0.0, 1.0]),
        ];
        assert!(matches!(
            index.add_batch(dup_within),
            Err(VectorError::DuplicateIntent(1))
        ));
        assert_eq!(index.len(), 1);

        let good = vec![
            (intent(1, "b"), vec![0.0, 1.0, 0.0]),
            (intent(2, "c"), vec![0.0, 0.0, 1.0]),
        ];
        assert_eq!(index.add_batch(good).unwrap(), vec![1, 2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_search_order_and_threshold() {
        let mut index = exact(Metric::Cosine);
        index.add(intent(0, "x"), &[1.0, 0.0, 0.0]).unwrap();
        index.add(intent(1, "xy"), &[0.8, 0.6, 0.0]).unwrap();
        index.add(intent(2, "y"), &[0.0, 1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3, None).unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.intent.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!((results[1].score - 0.8).abs() < 1e-6);

        let filtered = index.search(&[1.0, 0.0, 0.0], 3, Some(0.5)).unwrap();
        assert_eq!(filtered.len(), 2);

        let top = index.search(&[1.0, 0.0, 0.0], 1, None).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].intent.id, 0);
    }

    #[test]
    fn test_ties_prefer_earliest_label() {
        let mut index = exact(Metric::Cosine);
        index.add(intent(5, "late"), &[0.0, 1.0, 0.0]).unwrap();
        index.add(intent(6, "first"), &[1.0, 0.0, 0.0]).unwrap();
        index.add(intent(7, "second"), &[1.0, 0.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 1, None).unwrap();
        assert_eq!(results[0].intent.id, 6);
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = exact(Metric::Cosine);
        assert!(matches!(
            index.search(&[1.0; 4], 1, None),
            Err(VectorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cosine_scores_are_inner_products() {
        let mut index = exact(Metric::Cosine);
        // Unnormalized input is normalized before insertion
        index.add(intent(0, "a"), &[2.0, 0.0, 0.0]).unwrap();
        index.add(intent(1, "b"), &[-1.0, 0.0, 0.0]).unwrap();

        let results = index.search(&[5.0, 0.0, 0.0], 2, None).unwrap();
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score + 1.0).abs() < 1e-6);
        for result in &results {
            assert!((-1.0..=1.0).contains(&result.score));
        }
    }

    #[test]
    fn test_euclidean_scores_decrease_with_distance() {
        let mut index = exact(Metric::Euclidean);
        index.add(intent(0, "near"), &[0.1, 0.0, 0.0]).unwrap();
        index.add(intent(1, "mid"), &[0.5, 0.0, 0.0]).unwrap();
        index.add(intent(2, "far"), &[2.0, 0.0, 0.0]).unwrap();

        let results = index.search(&[0.0, 0.0, 0.0], 3, None).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].distance < pair[1].distance);
            assert!(pair[0].score > pair[1].score);
        }
        assert!((results[0].score - (-0.1f32).exp()).abs() < 1e-5);
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut index = IntentIndex::new(IndexConfig::new(Metric::Cosine, IndexBackend::Hnsw));
        index.initialize(16).unwrap();
        let pairs: Vec<(Intent, Vec<f32>)> = (0..50)
            .map(|i| (intent(i, "t"), random_unit(16)))
            .collect();
        index.add_batch(pairs).unwrap();

        let query = random_unit(16);
        let first = index.search(&query, 3, None).unwrap();
        for _ in 0..5 {
            assert_eq!(index.search(&query, 3, None).unwrap(), first);
        }
    }

    #[test]
    fn test_clear_and_dispose() {
        let mut index = exact(Metric::Cosine);
        index.add(intent(0, "a"), &[1.0, 0.0, 0.0]).unwrap();
        index.search(&[1.0, 0.0, 0.0], 1, None).unwrap();

        index.clear().unwrap();
        assert!(index.is_empty());
        assert_eq!(index.add(intent(0, "a"), &[1.0, 0.0, 0.0]).unwrap(), 0);

        let stats = index.stats();
        assert_eq!(stats.searches, 1);
        assert_eq!(stats.dimension, Some(3));
        assert_eq!(stats.metric, Some("cosine"));

        index.dispose();
        index.dispose();
        assert!(!index.is_initialized());
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1, None),
            Err(VectorError::NotInitialized)
        ));
    }
}
