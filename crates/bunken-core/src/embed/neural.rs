//! # MiniLM Sentence Embedder
//!
//! Local BERT inference of a sentence-transformer checkpoint (by default
//! `all-MiniLM-L6-v2`, 384 dimensions) using candle. Sentence vectors are
//! produced by masked mean pooling over the final hidden states, followed by
//! L2 normalization, matching the checkpoint's reference pipeline.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer as HfTokenizer, TruncationParams};

use crate::embed::Embedder;
use crate::error::{EmbedError, Result};

/// Truncation limit per input; titles and queries are far below this.
const MAX_TOKENS: usize = 512;

/// The hidden size is not readable from the upstream config type.
#[derive(Debug, Deserialize)]
struct ConfigDims {
    hidden_size: usize,
}

/// Sentence embedder backed by a local BERT checkpoint directory holding
/// `config.json`, `tokenizer.json`, and `model.safetensors`.
pub struct MiniLmEmbedder {
    tokenizer: HfTokenizer,
    model: BertModel,
    dimension: usize,
    model_id: String,
    device: Device,
}

impl MiniLmEmbedder {
    /// Loads the checkpoint from `model_dir`.
    ///
    /// Fails with [`EmbedError::ModelLoad`] when any of the three files is
    /// missing or malformed, so callers can fall back cleanly.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = model_dir.as_ref();
        let config_path = dir.join("config.json");
        let tokenizer_path = dir.join("tokenizer.json");
        let weights_path = dir.join("model.safetensors");

        for required in [&config_path, &tokenizer_path, &weights_path] {
            if !required.exists() {
                return Err(EmbedError::ModelLoad(format!(
                    "missing model file {}",
                    required.display()
                )));
            }
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to read config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to parse config: {e}")))?;
        let dims: ConfigDims = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to parse config: {e}")))?;

        let mut tokenizer = HfTokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device) }
            .map_err(|e| EmbedError::ModelLoad(e.to_string()))?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedError::ModelLoad(e.to_string()))?;

        let model_id = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "minilm".to_string());

        Ok(Self {
            tokenizer,
            model,
            dimension: dims.hidden_size,
            model_id,
            device,
        })
    }

    fn forward_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let mut id_rows = Vec::with_capacity(encodings.len());
        let mut mask_rows = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            id_rows.push(Tensor::new(encoding.get_ids(), &self.device).map_err(infer_err)?);
            mask_rows
                .push(Tensor::new(encoding.get_attention_mask(), &self.device).map_err(infer_err)?);
        }
        let token_ids = Tensor::stack(&id_rows, 0).map_err(infer_err)?;
        let attention_mask = Tensor::stack(&mask_rows, 0).map_err(infer_err)?;
        let token_type_ids = token_ids.zeros_like().map_err(infer_err)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))
            .map_err(infer_err)?;

        // Masked mean pooling over the token axis, then L2 normalization.
        // Padding positions contribute nothing to either sum.
        let mask = attention_mask.to_dtype(DType::F32).map_err(infer_err)?;
        let summed = hidden
            .broadcast_mul(&mask.unsqueeze(2).map_err(infer_err)?)
            .map_err(infer_err)?
            .sum(1)
            .map_err(infer_err)?;
        let counts = mask.sum_keepdim(1).map_err(infer_err)?;
        let pooled = summed.broadcast_div(&counts).map_err(infer_err)?;
        let normalized = normalize_l2(&pooled).map_err(infer_err)?;

        normalized.to_vec2::<f32>().map_err(infer_err)
    }
}

fn infer_err(e: candle_core::Error) -> EmbedError {
    EmbedError::Inference(e.to_string())
}

fn normalize_l2(v: &Tensor) -> candle_core::Result<Tensor> {
    v.broadcast_div(&v.sqr()?.sum_keepdim(1)?.sqrt()?)
}

impl Embedder for MiniLmEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut rows = self.embed_batch(&[text])?;
        rows.pop()
            .ok_or_else(|| EmbedError::Inference("model produced no output row".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(EmbedError::EmptyInput);
        }
        self.forward_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkpoint_fails_cleanly() {
        let err = match MiniLmEmbedder::load("/nonexistent/checkpoint") {
            Ok(_) => panic!("load succeeded without a checkpoint"),
            Err(err) => err,
        };
        assert!(matches!(err, EmbedError::ModelLoad(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    #[ignore = "requires a local all-MiniLM-L6-v2 checkpoint in BUNKEN_MODEL_DIR"]
    fn embeds_with_local_checkpoint() {
        let dir = std::env::var("BUNKEN_MODEL_DIR").expect("BUNKEN_MODEL_DIR not set");
        let embedder = MiniLmEmbedder::load(dir).unwrap();
        assert_eq!(embedder.dimension(), 384);

        let vectors = embedder
            .embed_batch(&["CAR-T therapy", "prostaglandin EP2 signaling"])
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 384);
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
