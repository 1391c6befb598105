//! Command implementations for the intent router.
//!
//! Handles:
//! - query: answer one utterance
//! - repl: answer utterances from stdin until EOF or `exit`
//! - detect: language detection only
//! - stats: catalog, index and cache diagnostics
//! - clear-cache: remove the embedding cache

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use intent_embeddings::{
    default_model_root, CandleEmbedder, EmbeddingProvider, HashingEmbedder, ModelStore,
};
use intent_retrieval::{
    builtin_catalog, EngineConfig, LanguageDetector, QueryResult, RetrievalEngine,
};
use intent_types::{ProviderKind, Settings};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::actions::{demo_registry, InMemoryDeviceRepository, UserProfile};
use crate::cli::ProviderArg;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    provider_override: Option<ProviderArg>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(provider) = provider_override {
        settings.embedding.provider = provider.into();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over settings.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Embedding provider selected by settings.
pub fn build_provider(settings: &Settings) -> Box<dyn EmbeddingProvider> {
    let embedding = &settings.embedding;
    match embedding.provider {
        ProviderKind::Candle => {
            let root = embedding
                .model_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(default_model_root);
            let store = ModelStore::new(root, embedding.repo_id.clone());
            Box::new(CandleEmbedder::new(store, embedding.dimension))
        }
        ProviderKind::Hashing => Box::new(HashingEmbedder::new(embedding.dimension)),
    }
}

/// Engine over the built-in catalog and demo handlers. Not initialized.
pub fn build_engine(settings: &Settings) -> RetrievalEngine {
    let devices = Arc::new(InMemoryDeviceRepository::with_sample_devices());
    let registry = demo_registry(devices, UserProfile::default());
    RetrievalEngine::new(
        EngineConfig::from(settings),
        build_provider(settings),
        builtin_catalog(),
        registry,
    )
}

async fn ready_engine(settings: &Settings) -> Result<RetrievalEngine> {
    info!(
        provider = ?settings.embedding.provider,
        metric = settings.index.metric.as_str(),
        cache_dir = %settings.cache_dir,
        "Starting intent router"
    );
    let mut engine = build_engine(settings);
    engine
        .initialize()
        .await
        .context("Failed to initialize retrieval engine")?;
    Ok(engine)
}

/// Human-readable rendering of a query result.
pub fn render_result(result: &QueryResult) -> String {
    let mut out = result.response.clone();
    if let (Some(intent), Some(confidence)) = (&result.matched_intent, result.confidence) {
        out.push_str(&format!(
            "\n  [{} | {:.3} | {}ms]",
            intent.action, confidence, result.execution_time_ms
        ));
    } else if let Some(suggestion) = &result.suggestion {
        out.push_str(&format!(
            "\n  [suggestion: {} | {:.3}]",
            suggestion.action, suggestion.score
        ));
    }
    out
}

fn print_result(result: &QueryResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", render_result(result));
    }
    Ok(())
}

/// Answer a single utterance.
pub async fn run_query(settings: &Settings, text: &str, json: bool) -> Result<()> {
    let mut engine = ready_engine(settings).await?;
    let result = engine.query(text).await;
    engine.dispose().await;
    print_result(&result?, json)
}

/// Read utterances from stdin until EOF, `exit` or `quit`.
pub async fn run_repl(settings: &Settings) -> Result<()> {
    let mut engine = ready_engine(settings).await?;
    println!("Intent router ready. Type \"exit\" to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "exit" | "quit" => break,
            ":stats" => {
                let stats = engine.get_stats().await;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            ":lang" => println!("{}", engine.get_detected_language().name()),
            _ => {
                let result = engine.query(&line).await?;
                println!("{}", render_result(&result));
            }
        }
    }

    engine.dispose().await;
    Ok(())
}

/// Detect the language of `text`.
pub fn run_detect(settings: &Settings, text: &str, json: bool) -> Result<()> {
    let detector = LanguageDetector::new(settings.detection.memo_capacity);
    let result = detector.detect(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} ({}) confidence {:.2}",
            result.language.name(),
            result.language.code(),
            result.confidence
        );
    }
    Ok(())
}

/// Print diagnostics without loading the model.
pub async fn show_stats(settings: &Settings, json: bool) -> Result<()> {
    let engine = build_engine(settings);
    let stats = engine.get_stats().await;
    let validation = engine.validate_cache().await;

    if json {
        let value = serde_json::json!({
            "engine": stats,
            "cacheValid": validation.as_ref().map(|v| v.valid),
            "cacheReason": validation.as_ref().and_then(|v| v.reason.clone()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Intent Router Statistics");
    println!("  Model:            {}", stats.model_id);
    println!("  Metric:           {}", stats.metric);
    println!("  Templates:        {}", stats.templates);
    println!("  Catalog intents:  {}", stats.catalog_intents);
    println!("  Actions:          {}", stats.actions);
    match (&stats.cache, &validation) {
        (Some(cache), Some(validation)) => {
            println!("  Cache dir:        {}", settings.expanded_cache_dir().display());
            println!("  Cache present:    {}", cache.exists);
            println!(
                "  Cache size:       {} bytes",
                cache.payload_bytes + cache.metadata_bytes
            );
            if let Some(age_ms) = cache.age_ms {
                println!("  Cache age:        {:.1} h", age_ms as f64 / 3_600_000.0);
            }
            match &validation.reason {
                None => println!("  Cache valid:      yes"),
                Some(reason) => println!("  Cache valid:      no ({})", reason),
            }
        }
        _ => println!("  Cache:            disabled"),
    }
    Ok(())
}

/// Remove the embedding cache.
pub async fn clear_cache(settings: &Settings) -> Result<()> {
    let engine = build_engine(settings);
    engine
        .clear_cache()
        .await
        .context("Failed to clear embedding cache")?;
    println!(
        "Cleared embedding cache at {}",
        settings.expanded_cache_dir().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_types::Intent;
    use intent_types::Language;
    use tempfile::TempDir;

    fn hashing_settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.embedding.provider = ProviderKind::Hashing;
        settings.embedding.dimension = 256;
        settings.cache_dir = dir.path().to_string_lossy().to_string();
        settings
    }

    #[test]
    fn test_build_provider_hashing() {
        let dir = TempDir::new().unwrap();
        let provider = build_provider(&hashing_settings(&dir));
        assert_eq!(provider.model_id(), "hashing-256");
        assert_eq!(provider.dimension(), 256);
    }

    #[test]
    fn test_build_provider_candle_is_lazy() {
        let settings = Settings::default();
        let provider = build_provider(&settings);
        assert!(!provider.is_initialized());
        assert_eq!(provider.dimension(), 384);
    }

    #[tokio::test]
    async fn test_engine_answers_builtin_phrase() {
        let dir = TempDir::new().unwrap();
        let mut engine = build_engine(&hashing_settings(&dir));
        engine.initialize().await.unwrap();

        let result = engine.query("list devices").await.unwrap();
        assert!(result.success);
        assert!(result.action_executed);
        assert!(result.response.contains("Living Room Lamp"));
        engine.dispose().await;
    }

    #[test]
    fn test_render_result() {
        let matched = QueryResult::matched(
            "You have 1250 points.".to_string(),
            Language::En,
            Intent::new(0, "check points", "getUserPoints"),
            0.91234,
            true,
        );
        let rendered = render_result(&matched);
        assert!(rendered.starts_with("You have 1250 points."));
        assert!(rendered.contains("getUserPoints | 0.912"));

        let failed = QueryResult::failure("Sorry".to_string(), Language::En);
        assert_eq!(render_result(&failed), "Sorry");
    }
}
