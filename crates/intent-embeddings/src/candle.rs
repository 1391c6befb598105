//! Candle-based embedding provider.
//!
//! Runs a BERT-family sentence-transformer locally. The default model is
//! paraphrase-multilingual-MiniLM-L12-v2 (384 dimensions, 50+ languages).

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::model_store::{InstalledModel, ModelFile, ModelStore};
use crate::error::EmbeddingError;
use crate::model::{ensure_not_empty, Embedding, EmbeddingProvider, ModelInfo};

/// Embedding dimension for the default model
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maximum sequence length
pub const MAX_SEQ_LENGTH: usize = 128;

struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Candle-based embedder. Model weights are loaded by `initialize()`.
pub struct CandleEmbedder {
    store: ModelStore,
    info: ModelInfo,
    loaded: Option<LoadedModel>,
}

impl CandleEmbedder {
    /// Create an unloaded embedder for the given model store.
    ///
    /// `dimension` must match the model's hidden size; the store refuses to
    /// install a model that disagrees.
    pub fn new(store: ModelStore, dimension: usize) -> Self {
        let info = ModelInfo {
            model_id: store.repo_id().to_string(),
            dimension,
            max_sequence_length: MAX_SEQ_LENGTH,
        };
        Self {
            store,
            info,
            loaded: None,
        }
    }

    /// Embedder for the default multilingual model
    pub fn with_defaults() -> Self {
        Self::new(ModelStore::default(), DEFAULT_EMBEDDING_DIM)
    }

    fn load(installed: &InstalledModel) -> Result<LoadedModel, EmbeddingError> {
        info!(path = ?installed.dir, "Loading embedding model...");

        // CPU only for now
        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(installed.path(ModelFile::Config))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(installed.path(ModelFile::Tokenizer))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[installed.path(ModelFile::Weights)],
                DType::F32,
                &device,
            )?
        };
        let model = BertModel::load(vb, &config)?;

        info!(
            dim = installed.manifest.hidden_size,
            max_seq = MAX_SEQ_LENGTH,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            model,
            tokenizer,
            device,
        })
    }

    fn loaded(&self) -> Result<&LoadedModel, EmbeddingError> {
        self.loaded.as_ref().ok_or(EmbeddingError::NotInitialized)
    }

    /// Run the forward pass for a batch of non-empty texts.
    fn forward(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let loaded = self.loaded()?;

        let encodings = loaded
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_SEQ_LENGTH);

        let mut input_ids: Vec<u32> = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask: Vec<u32> = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let truncated_len = ids.len().min(max_len);

            input_ids.extend_from_slice(&ids[..truncated_len]);
            input_ids.resize(input_ids.len() + (max_len - truncated_len), 0);
            attention_mask.extend_from_slice(&mask[..truncated_len]);
            attention_mask.resize(attention_mask.len() + (max_len - truncated_len), 0);
        }

        let batch_size = texts.len();
        let input_ids = Tensor::from_vec(input_ids, (batch_size, max_len), &loaded.device)?;
        let attention_mask = Tensor::from_vec(attention_mask, (batch_size, max_len), &loaded.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let output = loaded
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pooling(&output, &attention_mask)?;
        let pooled_vec: Vec<Vec<f32>> = pooled.to_vec2()?;

        debug!(count = pooled_vec.len(), "Batch complete");
        Ok(pooled_vec.into_iter().map(Embedding::new).collect())
    }
}

/// Mean pooling over token embeddings (excluding padding)
fn mean_pooling(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbeddingError> {
    let mask = attention_mask
        .unsqueeze(2)?
        .broadcast_as(embeddings.shape())?
        .to_dtype(DType::F32)?;

    let sum = embeddings.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok(sum.broadcast_div(&counts)?)
}

#[async_trait]
impl EmbeddingProvider for CandleEmbedder {
    async fn initialize(&mut self) -> Result<(), EmbeddingError> {
        if self.loaded.is_some() {
            return Ok(());
        }

        let store = self.store.clone();
        let expected_dim = self.info.dimension;
        let loaded = tokio::task::spawn_blocking(move || {
            let installed = store.fetch(expected_dim)?;
            Self::load(&installed)
        })
        .await
        .map_err(|e| EmbeddingError::ModelNotFound(format!("model loader failed: {}", e)))??;

        self.loaded = Some(loaded);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        ensure_not_empty(text)?;
        self.forward(&[text])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyInput)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.loaded()?;
        if texts.is_empty() {
            return Ok(vec![]);
        }
        for text in texts {
            ensure_not_empty(text)?;
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(32) {
            embeddings.extend(self.forward(chunk)?);
        }
        Ok(embeddings)
    }

    async fn dispose(&mut self) {
        if self.loaded.take().is_some() {
            debug!(model = %self.info.model_id, "Released embedding model");
        }
    }
}
