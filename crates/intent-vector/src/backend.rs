//! Nearest-neighbor backend trait.
//!
//! A backend is the raw search primitive: it stores vectors under integer
//! labels and returns metric-native values. Scoring, thresholds, intent
//! bookkeeping and tie-breaking live in [`crate::IntentIndex`].

use intent_types::Metric;

use crate::error::VectorError;

/// One raw neighbor from a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNeighbor {
    pub label: u64,
    /// Inner product for [`Metric::Cosine`] (higher = closer),
    /// Euclidean distance for [`Metric::Euclidean`] (lower = closer)
    pub raw: f32,
}

impl RawNeighbor {
    pub fn new(label: u64, raw: f32) -> Self {
        Self { label, raw }
    }
}

/// Trait for nearest-neighbor backends.
pub trait NeighborBackend: Send + Sync {
    fn metric(&self) -> Metric;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a vector under `label`. Dimension is checked by the caller.
    fn add(&mut self, label: u64, vector: &[f32]) -> Result<(), VectorError>;

    /// Up to `k` nearest neighbors, closest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RawNeighbor>, VectorError>;

    /// Drop all vectors, keeping dimension and metric.
    fn clear(&mut self) -> Result<(), VectorError>;
}

/// Order neighbors closest first, ties by ascending label.
pub fn sort_neighbors(metric: Metric, neighbors: &mut [RawNeighbor]) {
    neighbors.sort_by(|a, b| {
        let closeness = match metric {
            Metric::Cosine => b.raw.total_cmp(&a.raw),
            Metric::Euclidean => a.raw.total_cmp(&b.raw),
        };
        closeness.then(a.label.cmp(&b.label))
    });
}
