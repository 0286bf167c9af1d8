use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use findex_core::error::{Error, Result};
use findex_core::traits::Embedder;

use crate::pooling::masked_mean_l2;

const MAX_LEN: usize = 256;

/// Transformer embedder: a MiniLM-class BERT checkpoint run through candle,
/// masked-mean pooled and L2-normalized. Identical input and checkpoint
/// always produce the identical vector.
pub struct ModelEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    version: String,
}

impl ModelEmbedder {
    /// Load tokenizer, config and weights from a model directory. Any
    /// missing or unloadable piece is `ModelUnavailable`: fatal for the
    /// whole run, not per-document.
    pub fn load(model_dir: Option<&str>) -> Result<Self> {
        let device = pick_device();
        let model_dir = resolve_model_dir(model_dir)?;
        tracing::info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::ModelUnavailable(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::ModelUnavailable(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let config: BertConfig = serde_json::from_str(&config_text)
            .map_err(|e| Error::ModelUnavailable(format!("invalid model config: {e}")))?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path).map_err(|e| {
            Error::ModelUnavailable(format!(
                "failed to read weights from {}: {e}",
                weights_path.display()
            ))
        })?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let dim = config.hidden_size;
        let model = BertModel::load(vb, &config)
            .map_err(|e| Error::ModelUnavailable(format!("failed to build model: {e}")))?;
        tracing::info!(dim, "embedding model ready");

        Ok(Self {
            model,
            tokenizer,
            device,
            dim,
            version: "minilm-l6-v2".to_string(),
        })
    }

    fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| candle_core::Error::Msg(format!("tokenization failed: {e}")))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > MAX_LEN {
            ids.truncate(MAX_LEN);
            mask.truncate(MAX_LEN);
        }
        if ids.len() < MAX_LEN {
            let pad = MAX_LEN - ids.len();
            ids.extend(std::iter::repeat(0u32).take(pad));
            mask.extend(std::iter::repeat(0u32).take(pad));
        }

        let input_ids = Tensor::from_iter(ids, &self.device)?.reshape((1, MAX_LEN))?;
        let attention_mask = Tensor::from_iter(mask, &self.device)?.reshape((1, MAX_LEN))?;
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::U32, &self.device)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()
    }
}

impl Embedder for ModelEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn model_version(&self) -> &str {
        &self.version
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0f32; self.dim]);
        }
        let v = self
            .forward(text)
            .map_err(|e| Error::Embedding(e.to_string()))?;
        debug_assert_eq!(v.len(), self.dim);
        Ok(v)
    }
}

fn pick_device() -> Device {
    #[cfg(feature = "metal")]
    if let Ok(device) = Device::new_metal(0) {
        return device;
    }
    Device::Cpu
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = findex_core::config::expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(Error::ModelUnavailable(format!(
            "configured model dir does not exist: {}",
            p.display()
        )));
    }
    if let Ok(dir) = std::env::var("FINDEX_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    for candidate in ["models/minilm", "../models/minilm"] {
        let p = Path::new(candidate);
        if p.exists() {
            return Ok(p.to_path_buf());
        }
    }
    Err(Error::ModelUnavailable(
        "could not locate an embedding model directory; set embedding.model_dir or FINDEX_MODEL_DIR"
            .to_string(),
    ))
}
