//! Local cross-encoder inference with candle.
//!
//! A model key resolves to a directory holding `config.json`,
//! `model.safetensors` and `tokenizer.json` (the Hugging Face layout). A key
//! that is itself an existing directory is used as-is; otherwise it is looked
//! up under the backend's model root.

/// BERT sequence classifier.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Tokenizer loading.
pub mod tokenizer;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_transformers::models::bert::Config as BertConfig;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use self::bert::BertClassifier;
use self::device::{device_label, select_device};
use self::tokenizer::load_pair_tokenizer;
use super::{BackendError, Logits, ModelInfo, QueryPassagePair, ScoringBackend};
use crate::cache::ModelKey;
use crate::constants::DEFAULT_MAX_SEQ_LEN;

const REQUIRED_MODEL_FILES: [&str; 2] = ["config.json", "model.safetensors"];

/// Classification metadata carried next to the architecture in `config.json`.
#[derive(Debug, Default, Deserialize)]
struct ClassifierMetadata {
    #[serde(default)]
    num_labels: Option<usize>,
    #[serde(default)]
    id2label: Option<BTreeMap<String, String>>,
}

impl ClassifierMetadata {
    fn into_model_info(self) -> Result<ModelInfo, BackendError> {
        let mut id2label = BTreeMap::new();
        for (idx, label) in self.id2label.unwrap_or_default() {
            let idx: usize = idx.parse().map_err(|_| BackendError::ModelLoadFailed {
                reason: format!("id2label key '{idx}' is not an index"),
            })?;
            id2label.insert(idx, label);
        }

        let num_labels = self
            .num_labels
            .unwrap_or(if id2label.is_empty() { 1 } else { id2label.len() });

        Ok(ModelInfo {
            num_labels,
            id2label,
        })
    }
}

/// Parses `config.json` into the BERT architecture config and output metadata.
pub fn parse_model_config(content: &str) -> Result<(BertConfig, ModelInfo), BackendError> {
    let config: BertConfig =
        serde_json::from_str(content).map_err(|e| BackendError::ModelLoadFailed {
            reason: format!("failed to parse config: {e}"),
        })?;
    let metadata: ClassifierMetadata =
        serde_json::from_str(content).map_err(|e| BackendError::ModelLoadFailed {
            reason: format!("failed to parse classifier metadata: {e}"),
        })?;

    Ok((config, metadata.into_model_info()?))
}

/// A loaded classifier plus its declared output metadata.
#[derive(Clone)]
pub struct CandleModel {
    classifier: BertClassifier,
    info: ModelInfo,
}

impl std::fmt::Debug for CandleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleModel")
            .field("info", &self.info)
            .finish()
    }
}

/// Tokenized batch ready for the forward pass.
#[derive(Debug)]
pub struct EncodedBatch {
    input_ids: Tensor,
    type_ids: Tensor,
    attention_mask: Tensor,
}

/// [`ScoringBackend`] running BERT-family cross-encoders through candle.
pub struct CandleBackend {
    model_root: PathBuf,
    max_seq_len: usize,
    device: Device,
}

impl std::fmt::Debug for CandleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleBackend")
            .field("model_root", &self.model_root)
            .field("max_seq_len", &self.max_seq_len)
            .field("device", &device_label(&self.device))
            .finish()
    }
}

impl CandleBackend {
    /// Creates a backend resolving keys under `model_root`.
    pub fn new<P: Into<PathBuf>>(model_root: P) -> Result<Self, BackendError> {
        Self::with_max_seq_len(model_root, DEFAULT_MAX_SEQ_LEN)
    }

    /// Creates a backend with an explicit pair token limit.
    pub fn with_max_seq_len<P: Into<PathBuf>>(
        model_root: P,
        max_seq_len: usize,
    ) -> Result<Self, BackendError> {
        let device = select_device();
        debug!(device = device_label(&device), "Selected compute device for cross-encoder");

        Ok(Self {
            model_root: model_root.into(),
            max_seq_len,
            device,
        })
    }

    /// Root directory searched for model folders.
    pub fn model_root(&self) -> &Path {
        &self.model_root
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Maps a key to the model directory it names.
    pub fn resolve_model_dir(&self, key: &ModelKey) -> Result<PathBuf, BackendError> {
        let direct = PathBuf::from(key.as_str());
        let dir = if direct.is_dir() {
            direct
        } else {
            self.model_root.join(key.as_str())
        };

        if !dir.is_dir() {
            return Err(BackendError::ModelNotFound { path: dir });
        }

        Ok(dir)
    }

    fn check_model_files(dir: &Path) -> Result<(), BackendError> {
        for file in REQUIRED_MODEL_FILES {
            if !dir.join(file).is_file() {
                return Err(BackendError::ModelLoadFailed {
                    reason: format!("missing {file} in {}", dir.display()),
                });
            }
        }
        Ok(())
    }

}

fn stack(rows: Vec<Vec<u32>>, seq_len: usize, device: &Device) -> Result<Tensor, BackendError> {
    let n = rows.len();
    let flat: Vec<u32> = rows.into_iter().flatten().collect();
    Ok(Tensor::from_vec(flat, (n, seq_len), device)?)
}

/// Encodes `(query, passage)` pairs and stacks them into `[batch, seq]` tensors.
fn encode_pairs(
    tokenizer: &Tokenizer,
    inputs: Vec<(String, String)>,
    device: &Device,
) -> Result<EncodedBatch, BackendError> {
    let encodings =
        tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| BackendError::TokenizationFailed {
                reason: e.to_string(),
            })?;

    let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);
    let mut ids = Vec::with_capacity(encodings.len());
    let mut type_ids = Vec::with_capacity(encodings.len());
    let mut mask = Vec::with_capacity(encodings.len());
    for encoding in &encodings {
        ids.push(encoding.get_ids().to_vec());
        type_ids.push(encoding.get_type_ids().to_vec());
        mask.push(encoding.get_attention_mask().to_vec());
    }

    Ok(EncodedBatch {
        input_ids: stack(ids, seq_len, device)?,
        type_ids: stack(type_ids, seq_len, device)?,
        attention_mask: stack(mask, seq_len, device)?,
    })
}

#[async_trait]
impl ScoringBackend for CandleBackend {
    type Model = CandleModel;
    type Tokenizer = Arc<Tokenizer>;
    type Features = EncodedBatch;

    async fn load_model(&self, key: &ModelKey) -> Result<Self::Model, BackendError> {
        let dir = self.resolve_model_dir(key)?;
        Self::check_model_files(&dir)?;

        let content = tokio::fs::read_to_string(dir.join("config.json")).await?;
        let (config, info) = parse_model_config(&content)?;

        info!(
            model = %key,
            model_dir = %dir.display(),
            num_labels = info.num_labels,
            "Loading cross-encoder weights"
        );

        let device = self.device.clone();
        let num_labels = info.num_labels;
        let classifier = tokio::task::spawn_blocking(move || {
            BertClassifier::load(&dir, &config, num_labels, &device)
        })
        .await
        .map_err(|e| BackendError::ModelLoadFailed {
            reason: format!("model load task failed: {e}"),
        })?
        .map_err(|e| BackendError::ModelLoadFailed {
            reason: format!("failed to load BERT model: {e}"),
        })?;

        Ok(CandleModel { classifier, info })
    }

    async fn load_tokenizer(&self, key: &ModelKey) -> Result<Self::Tokenizer, BackendError> {
        let dir = self.resolve_model_dir(key)?;
        let max_seq_len = self.max_seq_len;

        let tokenizer =
            tokio::task::spawn_blocking(move || load_pair_tokenizer(&dir, max_seq_len))
                .await
                .map_err(|e| BackendError::TokenizerLoadFailed {
                    reason: format!("tokenizer load task failed: {e}"),
                })??;

        Ok(Arc::new(tokenizer))
    }

    fn model_info(&self, model: &Self::Model) -> ModelInfo {
        model.info.clone()
    }

    async fn tokenize(
        &self,
        tokenizer: &Self::Tokenizer,
        pairs: &[QueryPassagePair<'_>],
    ) -> Result<Self::Features, BackendError> {
        let tokenizer = Arc::clone(tokenizer);
        let device = self.device.clone();
        let inputs: Vec<(String, String)> = pairs
            .iter()
            .map(|p| (p.query.to_string(), p.passage.to_string()))
            .collect();

        tokio::task::spawn_blocking(move || encode_pairs(&tokenizer, inputs, &device))
            .await
            .map_err(|e| BackendError::TokenizationFailed {
                reason: format!("tokenization task failed: {e}"),
            })?
    }

    async fn infer(
        &self,
        model: &Self::Model,
        features: Self::Features,
    ) -> Result<Logits, BackendError> {
        let classifier = model.classifier.clone();

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>, BackendError> {
            let logits = classifier.forward(
                &features.input_ids,
                &features.type_ids,
                &features.attention_mask,
            )?;
            Ok(logits.to_dtype(DType::F32)?.to_vec2::<f32>()?)
        })
        .await
        .map_err(|e| BackendError::InferenceFailed {
            reason: format!("inference task failed: {e}"),
        })??;

        Logits::from_rows(rows)
    }
}
