//! # intent-retrieval
//!
//! Maps free-form utterances in any of seven languages onto catalog
//! actions by nearest-neighbor search over phrase embeddings.
//!
//! ## Components
//! - [`TemplateCatalog`]: language-indexed templates, flattened to intents
//! - [`LanguageDetector`]: pattern-scoring classifier with a bounded memo
//! - [`ActionDispatcher`]: routes a match to a frozen [`ActionRegistry`]
//! - [`RetrievalEngine`]: detect, embed, search, fall back, respond
//!
//! ## Usage
//! ```rust,no_run
//! use intent_embeddings::HashingEmbedder;
//! use intent_retrieval::{builtin_catalog, ActionRegistry, EngineConfig, RetrievalEngine};
//!
//! # async fn run() -> Result<(), intent_retrieval::EngineError> {
//! let registry = ActionRegistry::builder()
//!     .action("getUserPoints", || "You have 120 points".to_string())
//!     .build();
//! let mut engine = RetrievalEngine::new(
//!     EngineConfig::default(),
//!     Box::new(HashingEmbedder::default()),
//!     builtin_catalog(),
//!     registry,
//! );
//! engine.initialize().await?;
//! let result = engine.query("check my points").await?;
//! println!("{}", result.response);
//! engine.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod catalog;
pub mod detector;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod messages;
pub mod types;

pub use builtin::builtin_catalog;
pub use catalog::TemplateCatalog;
pub use detector::{DetectionResult, LanguageDetector, NEUTRAL_CONFIDENCE};
pub use dispatch::{
    extract_parameter, ActionDispatcher, ActionFn, ActionRegistry, ActionRegistryBuilder,
    DispatchOutcome, ParamActionFn,
};
pub use engine::{EngineConfig, RetrievalEngine};
pub use error::EngineError;
pub use types::{EngineState, EngineStats, QueryResult, Suggestion};
