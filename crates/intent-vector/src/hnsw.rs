//! HNSW backend using usearch.
//!
//! In-memory only; the index is rebuilt from the embedding cache on start.
//! Cosine indexes use inner product over unit vectors (`MetricKind::IP`),
//! euclidean indexes use squared L2 (`MetricKind::L2sq`) converted back to
//! plain distance.

use intent_types::{IndexSettings, Metric};
use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::backend::{sort_neighbors, NeighborBackend, RawNeighbor};
use crate::error::VectorError;

/// HNSW index configuration
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Number of connections per layer (M parameter)
    pub connectivity: usize,
    /// Build-time search depth (ef_construction)
    pub expansion_add: usize,
    /// Query-time search depth (ef_search)
    pub expansion_search: usize,
    /// Initial capacity; grows by doubling
    pub capacity: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            capacity: 4096,
        }
    }
}

impl HnswConfig {
    pub fn with_connectivity(mut self, m: usize) -> Self {
        self.connectivity = m;
        self
    }

    pub fn with_expansion(mut self, ef_add: usize, ef_search: usize) -> Self {
        self.expansion_add = ef_add;
        self.expansion_search = ef_search;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl From<&IndexSettings> for HnswConfig {
    fn from(settings: &IndexSettings) -> Self {
        Self {
            connectivity: settings.connectivity,
            expansion_add: settings.expansion_add,
            expansion_search: settings.expansion_search,
            capacity: settings.capacity,
        }
    }
}

/// usearch-backed approximate nearest-neighbor search.
pub struct HnswBackend {
    index: Index,
    config: HnswConfig,
    dimension: usize,
    metric: Metric,
}

impl HnswBackend {
    pub fn new(dimension: usize, metric: Metric, config: HnswConfig) -> Result<Self, VectorError> {
        let index = build_index(dimension, metric, &config)?;
        info!(dim = dimension, metric = metric.as_str(), "Created HNSW index");
        Ok(Self {
            index,
            config,
            dimension,
            metric,
        })
    }
}

fn build_index(dimension: usize, metric: Metric, config: &HnswConfig) -> Result<Index, VectorError> {
    let options = IndexOptions {
        dimensions: dimension,
        metric: match metric {
            Metric::Cosine => MetricKind::IP,
            Metric::Euclidean => MetricKind::L2sq,
        },
        quantization: ScalarKind::F32,
        connectivity: config.connectivity,
        expansion_add: config.expansion_add,
        expansion_search: config.expansion_search,
        multi: false,
    };

    let index = Index::new(&options).map_err(|e| VectorError::Index(e.to_string()))?;
    index
        .reserve(config.capacity.max(1))
        .map_err(|e| VectorError::Index(e.to_string()))?;
    Ok(index)
}

impl NeighborBackend for HnswBackend {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn add(&mut self, label: u64, vector: &[f32]) -> Result<(), VectorError> {
        if self.index.size() >= self.index.capacity() {
            let grown = (self.index.capacity() * 2).max(self.config.capacity).max(16);
            self.index
                .reserve(grown)
                .map_err(|e| VectorError::Index(e.to_string()))?;
            debug!(capacity = grown, "Grew HNSW capacity");
        }

        self.index
            .add(label, vector)
            .map_err(|e| VectorError::Index(e.to_string()))
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RawNeighbor>, VectorError> {
        if k == 0 || self.index.size() == 0 {
            return Ok(vec![]);
        }

        let matches = self
            .index
            .search(query, k)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        let mut neighbors: Vec<RawNeighbor> = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .map(|(&label, &distance)| {
                let raw = match self.metric {
                    // usearch reports IP as 1 - dot
                    Metric::Cosine => 1.0 - distance,
                    Metric::Euclidean => distance.max(0.0).sqrt(),
                };
                RawNeighbor::new(label, raw)
            })
            .collect();

        sort_neighbors(self.metric, &mut neighbors);
        Ok(neighbors)
    }

    fn clear(&mut self) -> Result<(), VectorError> {
        self.index = build_index(self.dimension, self.metric, &self.config)?;
        info!("Cleared HNSW index");
        Ok(())
    }
}
