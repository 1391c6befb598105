//! Configuration loading for the intent router.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/intent-router/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RouterError;

/// Similarity metric used by the vector index.
///
/// Scores live on different scales per metric, so each metric has its own
/// threshold pair in [`MatchSettings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Inner product over unit-normalized vectors
    #[default]
    Cosine,
    /// Euclidean distance mapped through `exp(-d / scale)`
    Euclidean,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
        }
    }
}

/// Nearest-neighbor backend implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// usearch HNSW graph
    #[default]
    Hnsw,
    /// Brute-force scan, exact and deterministic
    Exact,
}

/// Embedding provider implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local sentence-transformer via candle
    #[default]
    Candle,
    /// Feature-hashing embedder, offline and deterministic
    Hashing,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub provider: ProviderKind,

    /// HuggingFace repository of the sentence-transformer
    #[serde(default = "default_repo_id")]
    pub repo_id: String,

    /// Expected embedding dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Where model files are cached (default: platform cache dir)
    #[serde(default)]
    pub model_dir: Option<String>,
}

fn default_repo_id() -> String {
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            repo_id: default_repo_id(),
            dimension: default_dimension(),
            model_dir: None,
        }
    }
}

impl EmbeddingSettings {
    /// Identifier recorded in cache metadata as the model path.
    pub fn model_id(&self) -> String {
        match self.provider {
            ProviderKind::Candle => self.repo_id.clone(),
            ProviderKind::Hashing => format!("hashing-{}", self.dimension),
        }
    }
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub backend: IndexBackend,

    /// Scale constant C in `score = exp(-d / C)` for euclidean indexes.
    /// Empirical; recalibrate per embedding model.
    #[serde(default = "default_euclidean_scale")]
    pub euclidean_scale: f32,

    /// HNSW connections per layer (M)
    #[serde(default = "default_connectivity")]
    pub connectivity: usize,

    /// HNSW build-time search depth (ef_construction)
    #[serde(default = "default_expansion_add")]
    pub expansion_add: usize,

    /// HNSW query-time search depth (ef_search)
    #[serde(default = "default_expansion_search")]
    pub expansion_search: usize,

    /// Pre-allocated capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_euclidean_scale() -> f32 {
    1.0
}

fn default_connectivity() -> usize {
    16
}

fn default_expansion_add() -> usize {
    128
}

fn default_expansion_search() -> usize {
    64
}

fn default_capacity() -> usize {
    4096
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            backend: IndexBackend::default(),
            euclidean_scale: default_euclidean_scale(),
            connectivity: default_connectivity(),
            expansion_add: default_expansion_add(),
            expansion_search: default_expansion_search(),
            capacity: default_capacity(),
        }
    }
}

/// Threshold policy for primary and fuzzy matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Candidates requested by the primary search
    #[serde(default = "default_primary_k")]
    pub primary_k: usize,

    #[serde(default = "default_cosine_threshold")]
    pub cosine_threshold: f32,

    #[serde(default = "default_euclidean_threshold")]
    pub euclidean_threshold: f32,

    /// Retry once with a relaxed threshold when the primary search is empty
    #[serde(default = "default_true")]
    pub fuzzy_enabled: bool,

    #[serde(default = "default_fuzzy_cosine_threshold")]
    pub fuzzy_cosine_threshold: f32,

    #[serde(default = "default_fuzzy_euclidean_threshold")]
    pub fuzzy_euclidean_threshold: f32,
}

fn default_primary_k() -> usize {
    3
}

fn default_cosine_threshold() -> f32 {
    0.65
}

fn default_euclidean_threshold() -> f32 {
    0.35
}

fn default_true() -> bool {
    true
}

fn default_fuzzy_cosine_threshold() -> f32 {
    0.4
}

fn default_fuzzy_euclidean_threshold() -> f32 {
    0.2
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            primary_k: default_primary_k(),
            cosine_threshold: default_cosine_threshold(),
            euclidean_threshold: default_euclidean_threshold(),
            fuzzy_enabled: true,
            fuzzy_cosine_threshold: default_fuzzy_cosine_threshold(),
            fuzzy_euclidean_threshold: default_fuzzy_euclidean_threshold(),
        }
    }
}

impl MatchSettings {
    /// Primary threshold for the given metric.
    pub fn threshold(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Cosine => self.cosine_threshold,
            Metric::Euclidean => self.euclidean_threshold,
        }
    }

    /// Relaxed threshold for the fuzzy retry.
    pub fn fuzzy_threshold(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Cosine => self.fuzzy_cosine_threshold,
            Metric::Euclidean => self.fuzzy_euclidean_threshold,
        }
    }

    /// Validate threshold ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.primary_k == 0 {
            return Err("primary_k must be > 0".to_string());
        }
        for (name, value) in [
            ("cosine_threshold", self.cosine_threshold),
            ("fuzzy_cosine_threshold", self.fuzzy_cosine_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(format!("{} must be -1.0-1.0, got {}", name, value));
            }
        }
        for (name, value) in [
            ("euclidean_threshold", self.euclidean_threshold),
            ("fuzzy_euclidean_threshold", self.fuzzy_euclidean_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be 0.0-1.0, got {}", name, value));
            }
        }
        if self.fuzzy_cosine_threshold > self.cosine_threshold
            || self.fuzzy_euclidean_threshold > self.euclidean_threshold
        {
            return Err("fuzzy thresholds must not exceed primary thresholds".to_string());
        }
        Ok(())
    }
}

/// Embedding cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Caches older than this are discarded on load
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

fn default_max_age_hours() -> u64 {
    24 * 7
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_hours: default_max_age_hours(),
        }
    }
}

/// Language detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Bound on memoized detection results (0 disables memoization)
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,
}

fn default_memo_capacity() -> usize {
    1024
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            memo_capacity: default_memo_capacity(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the embedding cache files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub index: IndexSettings,

    #[serde(default)]
    pub matching: MatchSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub detection: DetectionSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_dir() -> String {
    ProjectDirs::from("", "", "intent-router")
        .map(|p| p.data_local_dir().join("cache"))
        .unwrap_or_else(|| PathBuf::from("./.intent-cache"))
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            cache_dir: default_cache_dir(),
            embedding: EmbeddingSettings::default(),
            index: IndexSettings::default(),
            matching: MatchSettings::default(),
            cache: CacheSettings::default(),
            detection: DetectionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/intent-router/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (INTENT_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, RouterError> {
        let config_dir = ProjectDirs::from("", "", "intent-router")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| RouterError::Config(e.to_string()))?
            .set_default("cache_dir", default_cache_dir())
            .map_err(|e| RouterError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: INTENT_LOG_LEVEL, INTENT_MATCHING__COSINE_THRESHOLD, etc.
        builder = builder.add_source(
            Environment::with_prefix("INTENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| RouterError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| RouterError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.embedding.dimension == 0 {
            return Err(RouterError::Config("embedding.dimension must be > 0".to_string()));
        }
        // NaN fails every comparison, so test for the valid range
        let scale = self.index.euclidean_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RouterError::Config(format!(
                "index.euclidean_scale must be > 0, got {}",
                self.index.euclidean_scale
            )));
        }
        self.matching
            .validate()
            .map_err(|e| RouterError::Config(format!("matching: {}", e)))
    }

    /// Expand ~ in cache_dir to the home directory.
    pub fn expanded_cache_dir(&self) -> PathBuf {
        if let Some(rest) = self.cache_dir.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.cache_dir)
    }

    /// Maximum cache age in milliseconds.
    pub fn max_cache_age_ms(&self) -> i64 {
        (self.cache.max_age_hours as i64).saturating_mul(3_600_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.index.metric, Metric::Cosine);
        assert_eq!(settings.embedding.dimension, 384);
        assert_eq!(settings.matching.primary_k, 3);
        assert!(settings.matching.fuzzy_enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_thresholds_are_metric_specific() {
        let matching = MatchSettings::default();
        assert!(matching.threshold(Metric::Euclidean) < matching.threshold(Metric::Cosine));
        assert!(matching.fuzzy_threshold(Metric::Cosine) < matching.threshold(Metric::Cosine));
        assert!(
            matching.fuzzy_threshold(Metric::Euclidean) < matching.threshold(Metric::Euclidean)
        );
    }

    #[test]
    fn test_match_settings_validation() {
        let mut matching = MatchSettings::default();
        assert!(matching.validate().is_ok());

        matching.euclidean_threshold = 1.5;
        assert!(matching.validate().is_err());

        matching.euclidean_threshold = 0.35;
        matching.fuzzy_cosine_threshold = 0.9;
        assert!(matching.validate().is_err());

        matching.fuzzy_cosine_threshold = 0.4;
        matching.primary_k = 0;
        assert!(matching.validate().is_err());
    }

    #[test]
    fn test_settings_rejects_bad_scale() {
        let mut settings = Settings::default();
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            settings.index.euclidean_scale = scale;
            assert!(
                matches!(settings.validate(), Err(RouterError::Config(_))),
                "scale {} accepted",
                scale
            );
        }

        settings.index.euclidean_scale = 0.5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_model_id_per_provider() {
        let mut embedding = EmbeddingSettings::default();
        assert_eq!(embedding.model_id(), default_repo_id());

        embedding.provider = ProviderKind::Hashing;
        embedding.dimension = 256;
        assert_eq!(embedding.model_id(), "hashing-256");
    }

    #[test]
    fn test_max_cache_age() {
        let settings = Settings::default();
        assert_eq!(settings.max_cache_age_ms(), 7 * 24 * 3_600_000);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"metric\":\"cosine\""));
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.index.backend, IndexBackend::Hnsw);
        assert!((decoded.matching.cosine_threshold - 0.65).abs() < f32::EPSILON);
    }
}
