//! # intent-types
//!
//! Shared domain types for the intent router.
//!
//! - Intents: (text, action) pairs that the retrieval pipeline can match
//! - Templates: language-indexed bundles of example phrases for one action
//! - Languages: the seven supported input languages
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use intent_types::{Intent, Language, Template};
//!
//! let template = Template::new("points", "getUserPoints", "user")
//!     .with_phrases(Language::En, ["check points"]);
//! assert_eq!(template.phrase_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod intent;
pub mod language;

pub use config::{
    CacheSettings, DetectionSettings, EmbeddingSettings, IndexBackend, IndexSettings,
    MatchSettings, Metric, ProviderKind, Settings,
};
pub use error::RouterError;
pub use intent::{Intent, Template};
pub use language::Language;
