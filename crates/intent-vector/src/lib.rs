//! # intent-vector
//!
//! Nearest-neighbor index over intent embeddings.
//!
//! ## Features
//! - HNSW backend via usearch for approximate search
//! - Exact brute-force backend for small catalogs and tests
//! - Metric-aware scoring: inner product for cosine, `exp(-d / C)` for euclidean
//! - Deterministic ordering: score descending, ties by insertion label
//!
//! ## Usage
//! ```rust
//! use intent_types::{IndexBackend, Intent, Metric};
//! use intent_vector::{IndexConfig, IntentIndex};
//!
//! let mut index = IntentIndex::new(IndexConfig::new(Metric::Cosine, IndexBackend::Exact));
//! index.initialize(2).unwrap();
//! index.add(Intent::new(0, "check my points", "getUserPoints"), &[1.0, 0.0]).unwrap();
//!
//! let results = index.search(&[1.0, 0.0], 3, Some(0.65)).unwrap();
//! assert_eq!(results[0].intent.action, "getUserPoints");
//! ```

pub mod backend;
pub mod error;
pub mod exact;
pub mod hnsw;
pub mod index;
pub mod score;

pub use backend::{sort_neighbors, NeighborBackend, RawNeighbor};
pub use error::VectorError;
pub use exact::ExactBackend;
pub use hnsw::{HnswBackend, HnswConfig};
pub use index::{IndexConfig, IndexStats, IntentIndex, SearchResult};
pub use score::ScoreTransform;
