//! Metric-dependent scoring.
//!
//! - Euclidean: `score = exp(-d / scale)`, in (0, 1], strictly decreasing in d
//! - Cosine: `score = inner product` of unit vectors, in [-1, 1]

use intent_embeddings::normalize;
use intent_types::Metric;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTransform {
    pub metric: Metric,
    /// Only used for euclidean
    pub euclidean_scale: f32,
}

impl ScoreTransform {
    pub fn new(metric: Metric, euclidean_scale: f32) -> Self {
        Self {
            metric,
            euclidean_scale,
        }
    }

    /// Similarity score for a backend raw value; higher is better.
    pub fn score(&self, raw: f32) -> f32 {
        match self.metric {
            Metric::Cosine => raw,
            Metric::Euclidean => (-raw / self.euclidean_scale).exp(),
        }
    }

    /// Distance reported alongside the score; lower is better.
    pub fn distance(&self, raw: f32) -> f32 {
        match self.metric {
            Metric::Cosine => 1.0 - raw,
            Metric::Euclidean => raw,
        }
    }

    /// Cosine indexes store and query unit vectors only.
    pub fn prepare(&self, vector: &[f32]) -> Vec<f32> {
        match self.metric {
            Metric::Cosine => normalize(vector.to_vec()),
            Metric::Euclidean => vector.to_vec(),
        }
    }
}
