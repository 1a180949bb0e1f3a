//! DistilBERT encoders with task heads, loaded from Hugging Face checkpoints.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{LayerNorm, Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config, DistilBertModel};
use serde::Deserialize;

/// The `config.json` fields the task heads need beyond the encoder config.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    /// Hidden size of the encoder.
    pub dim: usize,
    /// Vocabulary size of the masked-LM projector.
    pub vocab_size: usize,
    /// Longest sequence the position embeddings cover.
    #[serde(default = "default_max_positions")]
    pub max_position_embeddings: usize,
    /// Label names of a token-classification checkpoint, keyed by index.
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

fn default_max_positions() -> usize {
    512
}

impl HeadConfig {
    /// Label names ordered by index.
    pub fn labels(&self) -> std::result::Result<Vec<String>, String> {
        let mut labels = vec![None; self.id2label.len()];
        for (idx, label) in &self.id2label {
            let idx: usize = idx
                .parse()
                .map_err(|_| format!("non-numeric label index {idx:?}"))?;
            let slot = labels
                .get_mut(idx)
                .ok_or_else(|| format!("label index {idx} out of range"))?;
            *slot = Some(label.clone());
        }
        labels
            .into_iter()
            .enumerate()
            .map(|(idx, l)| l.ok_or_else(|| format!("missing label for index {idx}")))
            .collect()
    }
}

/// Read both the encoder config and the head config from one `config.json`.
pub fn read_configs(path: &Path) -> std::result::Result<(Config, HeadConfig), String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let encoder: Config = serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse encoder config: {e}"))?;
    let head: HeadConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse head config: {e}"))?;
    Ok((encoder, head))
}

/// Attention mask letting every position attend to every other one.
///
/// The encoder treats nonzero entries as excluded positions.
pub fn full_attention_mask(seq_len: usize, device: &Device) -> Result<Tensor> {
    Tensor::zeros((seq_len, seq_len), DType::U8, device)
}

/// DistilBERT + linear token-classification head.
pub struct TokenClassifier {
    pub distilbert: DistilBertModel,
    pub classifier: Linear,
}

impl TokenClassifier {
    /// Load from a `DistilBertForTokenClassification` checkpoint.
    pub fn load(vb: VarBuilder, config: &Config, head: &HeadConfig) -> Result<Self> {
        let distilbert = DistilBertModel::load(vb.pp("distilbert"), config)?;
        let classifier = candle_nn::linear(head.dim, head.id2label.len(), vb.pp("classifier"))?;
        Ok(Self {
            distilbert,
            classifier,
        })
    }

    /// Per-token label logits.
    /// `input_ids`: [batch_size, seq_len]; returns [batch_size, seq_len, num_labels]
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.distilbert.forward(input_ids, attention_mask)?;
        self.classifier.forward(&hidden_states)
    }
}

/// DistilBERT + masked language modelling head.
pub struct MaskedLm {
    pub distilbert: DistilBertModel,
    pub vocab_transform: Linear,
    pub vocab_layer_norm: LayerNorm,
    pub vocab_projector: Linear,
}

impl MaskedLm {
    /// Load from a `DistilBertForMaskedLM` checkpoint.
    pub fn load(vb: VarBuilder, config: &Config, head: &HeadConfig) -> Result<Self> {
        let distilbert = DistilBertModel::load(vb.pp("distilbert"), config)?;
        let vocab_transform = candle_nn::linear(head.dim, head.dim, vb.pp("vocab_transform"))?;
        let vocab_layer_norm = candle_nn::layer_norm(head.dim, 1e-12, vb.pp("vocab_layer_norm"))?;
        let vocab_projector =
            candle_nn::linear(head.dim, head.vocab_size, vb.pp("vocab_projector"))?;
        Ok(Self {
            distilbert,
            vocab_transform,
            vocab_layer_norm,
            vocab_projector,
        })
    }

    /// Vocabulary logits for every position.
    /// `input_ids`: [batch_size, seq_len]; returns [batch_size, seq_len, vocab_size]
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.distilbert.forward(input_ids, attention_mask)?;
        let hidden_states = self.vocab_transform.forward(&hidden_states)?.gelu_erf()?;
        let hidden_states = self.vocab_layer_norm.forward(&hidden_states)?;
        self.vocab_projector.forward(&hidden_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(id2label: &[(&str, &str)]) -> HeadConfig {
        HeadConfig {
            dim: 8,
            vocab_size: 10,
            max_position_embeddings: 512,
            id2label: id2label
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_labels_ordered_by_index() {
        let config = head(&[("2", "I-PER"), ("0", "O"), ("1", "B-PER")]);
        assert_eq!(config.labels().unwrap(), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn test_labels_with_gap_fail() {
        let config = head(&[("0", "O"), ("2", "B-PER")]);
        assert!(config.labels().is_err());
    }

    #[test]
    fn test_full_attention_mask_is_zero() {
        let mask = full_attention_mask(3, &Device::Cpu).unwrap();
        assert_eq!(mask.dims(), &[3, 3]);
        let values: Vec<Vec<u8>> = mask.to_vec2().unwrap();
        assert!(values.iter().flatten().all(|&v| v == 0));
    }

    #[test]
    fn test_head_config_defaults() {
        let config: HeadConfig =
            serde_json::from_str(r#"{"dim": 768, "vocab_size": 30000}"#).unwrap();
        assert_eq!(config.max_position_embeddings, 512);
        assert!(config.id2label.is_empty());
    }
}
