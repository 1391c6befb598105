//! Brute-force backend.
//!
//! Scans every stored vector. Exact and deterministic, and fast enough for
//! catalogs of a few thousand phrases.

use intent_types::Metric;

use crate::backend::{sort_neighbors, NeighborBackend, RawNeighbor};
use crate::error::VectorError;

pub struct ExactBackend {
    dimension: usize,
    metric: Metric,
    entries: Vec<(u64, Vec<f32>)>,
}

impl ExactBackend {
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            entries: Vec::new(),
        }
    }

    fn raw(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::Cosine => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl NeighborBackend for ExactBackend {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn add(&mut self, label: u64, vector: &[f32]) -> Result<(), VectorError> {
        self.entries.push((label, vector.to_vec()));
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RawNeighbor>, VectorError> {
        let mut neighbors: Vec<RawNeighbor> = self
            .entries
            .iter()
            .map(|(label, vector)| RawNeighbor::new(*label, self.raw(query, vector)))
            .collect();
        sort_neighbors(self.metric, &mut neighbors);
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn clear(&mut self) -> Result<(), VectorError> {
        self.entries.clear();
        Ok(())
    }
}
