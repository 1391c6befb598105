//! On-disk model store.
//!
//! Every repository gets one directory under the store root, named
//! `<owner>--<name>`. Files are fetched into a sibling `.partial` directory
//! and moved into place only after the config's `hidden_size` matches the
//! dimension the caller expects. [`MANIFEST_FILE`] is written into the
//! staging directory last; a model directory whose manifest is missing or
//! disagrees with the files on disk is not installed and is fetched again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EmbeddingError;

/// Default multilingual model repository on HuggingFace
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

/// Name of the install record inside a model directory
pub const MANIFEST_FILE: &str = "manifest.json";

const STAGING_SUFFIX: &str = ".partial";

/// Files a sentence-transformer needs for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFile {
    Config,
    Tokenizer,
    Weights,
}

impl ModelFile {
    pub const ALL: [ModelFile; 3] = [ModelFile::Config, ModelFile::Tokenizer, ModelFile::Weights];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelFile::Config => "config.json",
            ModelFile::Tokenizer => "tokenizer.json",
            ModelFile::Weights => "model.safetensors",
        }
    }
}

/// Where model files come from when the store has to fetch them.
pub trait ModelSource {
    /// Local path of `file` from `repo_id`. May block on the network.
    fn locate(&self, repo_id: &str, file: ModelFile) -> Result<PathBuf, EmbeddingError>;
}

/// HuggingFace Hub via the blocking hf-hub client.
pub struct HubSource {
    api: hf_hub::api::sync::Api,
}

impl HubSource {
    pub fn new() -> Result<Self, EmbeddingError> {
        let api =
            hf_hub::api::sync::Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
        Ok(Self { api })
    }
}

impl ModelSource for HubSource {
    fn locate(&self, repo_id: &str, file: ModelFile) -> Result<PathBuf, EmbeddingError> {
        self.api
            .model(repo_id.to_string())
            .get(file.file_name())
            .map_err(|e| EmbeddingError::Download(format!("{}: {}", file.file_name(), e)))
    }
}

/// Install record written next to the model files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    pub repo_id: String,
    pub hidden_size: usize,
    /// Byte length of each file, keyed by file name
    pub files: BTreeMap<String, u64>,
}

/// A verified model directory.
#[derive(Debug, Clone)]
pub struct InstalledModel {
    pub dir: PathBuf,
    pub manifest: ModelManifest,
}

impl InstalledModel {
    pub fn path(&self, file: ModelFile) -> PathBuf {
        self.dir.join(file.file_name())
    }
}

/// Platform cache directory for downloaded models.
pub fn default_model_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("intent-router")
        .join("models")
}

/// Check that `repo_id` is a plain `owner/name` pair.
pub fn validate_repo_id(repo_id: &str) -> Result<(), EmbeddingError> {
    fn valid_part(part: &str) -> bool {
        !part.is_empty()
            && part != "."
            && part != ".."
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    let mut parts = repo_id.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if valid_part(owner) && valid_part(name) => Ok(()),
        _ => Err(EmbeddingError::InvalidRepoId(repo_id.to_string())),
    }
}

/// Read `hidden_size` from a BERT config.json.
pub(crate) fn hidden_size(config_json: &str) -> Result<usize, EmbeddingError> {
    let value: serde_json::Value = serde_json::from_str(config_json)
        .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;
    value
        .get("hidden_size")
        .and_then(serde_json::Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| EmbeddingError::ModelNotFound("config has no hidden_size".to_string()))
}

/// One repository's slot in the local model cache.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
    repo_id: String,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(default_model_root(), DEFAULT_MODEL_REPO)
    }
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_id: repo_id.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Directory holding the installed files
    pub fn model_dir(&self) -> PathBuf {
        self.root.join(self.dir_name())
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.join(format!("{}{}", self.dir_name(), STAGING_SUFFIX))
    }

    fn dir_name(&self) -> String {
        self.repo_id.replace('/', "--")
    }

    /// The installed model, if its manifest matches this repo, `dimension`
    /// and the file sizes on disk.
    pub fn installed(&self, dimension: usize) -> Option<InstalledModel> {
        let dir = self.model_dir();
        let manifest = match read_manifest(&dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!(path = ?dir, error = %e, "No usable model manifest");
                return None;
            }
        };
        match self.verify(&dir, &manifest, dimension) {
            Ok(()) => Some(InstalledModel { dir, manifest }),
            Err(reason) => {
                warn!(path = ?dir, reason = %reason, "Installed model is stale");
                None
            }
        }
    }

    fn verify(&self, dir: &Path, manifest: &ModelManifest, dimension: usize) -> Result<(), String> {
        if manifest.repo_id != self.repo_id {
            return Err(format!("manifest is for {}", manifest.repo_id));
        }
        if manifest.hidden_size != dimension {
            return Err(format!(
                "hidden size {} does not match dimension {}",
                manifest.hidden_size, dimension
            ));
        }
        for file in ModelFile::ALL {
            let name = file.file_name();
            let recorded = manifest
                .files
                .get(name)
                .ok_or_else(|| format!("{} not in manifest", name))?;
            let actual = fs::metadata(dir.join(name))
                .map(|meta| meta.len())
                .map_err(|_| format!("{} missing", name))?;
            if actual != *recorded {
                return Err(format!("{} is {} bytes, manifest says {}", name, actual, recorded));
            }
        }
        Ok(())
    }

    /// Installed model, downloading from HuggingFace Hub when absent.
    ///
    /// Blocking; callers on an async runtime should run this on a blocking thread.
    pub fn fetch(&self, dimension: usize) -> Result<InstalledModel, EmbeddingError> {
        validate_repo_id(&self.repo_id)?;
        if let Some(model) = self.installed(dimension) {
            debug!(path = ?model.dir, "Using local model files");
            return Ok(model);
        }
        let source = HubSource::new()?;
        self.install_from(&source, dimension)
    }

    /// Fetch every file from `source` and replace the installed copy.
    pub fn install_from(
        &self,
        source: &dyn ModelSource,
        dimension: usize,
    ) -> Result<InstalledModel, EmbeddingError> {
        validate_repo_id(&self.repo_id)?;

        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let manifest = match self.stage(source, &staging, dimension) {
            Ok(manifest) => manifest,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!(path = ?staging, error = %cleanup, "Failed to remove staging directory");
                }
                return Err(e);
            }
        };

        let dir = self.model_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::rename(&staging, &dir)?;
        info!(repo = %self.repo_id, path = ?dir, hidden_size = manifest.hidden_size, "Model installed");

        Ok(InstalledModel { dir, manifest })
    }

    fn stage(
        &self,
        source: &dyn ModelSource,
        staging: &Path,
        dimension: usize,
    ) -> Result<ModelManifest, EmbeddingError> {
        let mut files = BTreeMap::new();
        for file in ModelFile::ALL {
            info!(repo = %self.repo_id, file = file.file_name(), "Fetching model file");
            let located = source.locate(&self.repo_id, file)?;
            let bytes = fs::copy(&located, staging.join(file.file_name()))?;
            files.insert(file.file_name().to_string(), bytes);
        }

        let config = fs::read_to_string(staging.join(ModelFile::Config.file_name()))?;
        let hidden_size = hidden_size(&config)?;
        if hidden_size != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: hidden_size,
            });
        }

        let manifest = ModelManifest {
            repo_id: self.repo_id.clone(),
            hidden_size,
            files,
        };
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| EmbeddingError::Manifest(e.to_string()))?;
        fs::write(staging.join(MANIFEST_FILE), json)?;
        Ok(manifest)
    }
}

fn read_manifest(dir: &Path) -> Result<ModelManifest, EmbeddingError> {
    let bytes = fs::read(dir.join(MANIFEST_FILE))?;
    serde_json::from_slice(&bytes).map_err(|e| EmbeddingError::Manifest(e.to_string()))
}
