//! DistilBERT masked-language-model filler.

use std::path::Path;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use clinlp_core::ClinlpError;
use clinlp_core::model::{MaskedLm, full_attention_mask, read_configs};
use tokenizers::Tokenizer;

use crate::mask::MaskFiller;

/// [`MaskFiller`] running a `DistilBertForMaskedLM` checkpoint.
pub struct DistilBertFiller {
    tokenizer: Tokenizer,
    model: MaskedLm,
    mask_token: String,
    mask_id: u32,
    device: Device,
}

impl DistilBertFiller {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` from `model_dir`.
    ///
    /// `mask_token` is the placeholder the sentences carry; it must be a
    /// token of the tokenizer's vocabulary.
    pub fn load(model_dir: impl AsRef<Path>, mask_token: &str) -> clinlp_core::Result<Self> {
        let model_dir = model_dir.as_ref();
        let device = Device::Cpu;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let weights_path = model_dir.join("model.safetensors");
        for path in [&tokenizer_path, &weights_path] {
            if !path.exists() {
                return Err(ClinlpError::ModelLoadError(format!(
                    "{} not found",
                    path.display()
                )));
            }
        }

        tracing::info!("Loading model from {}", model_dir.display());
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ClinlpError::Tokenizer(e.to_string()))?;
        let mask_id = tokenizer.token_to_id(mask_token).ok_or_else(|| {
            ClinlpError::Tokenizer(format!("mask token {mask_token:?} is not in the vocabulary"))
        })?;

        let (config, head) =
            read_configs(&model_dir.join("config.json")).map_err(ClinlpError::ModelLoadError)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device) }?;
        let model = MaskedLm::load(vb, &config, &head)?;

        Ok(Self {
            tokenizer,
            model,
            mask_token: mask_token.to_string(),
            mask_id,
            device,
        })
    }
}

impl MaskFiller for DistilBertFiller {
    fn fill(&self, sentence: &str, top_k: usize) -> clinlp_core::Result<Vec<String>> {
        let found = sentence.matches(self.mask_token.as_str()).count();
        if found != 1 {
            return Err(ClinlpError::MaskCount {
                sentence: sentence.to_string(),
                found,
            });
        }

        let encoding = self
            .tokenizer
            .encode(sentence, true)
            .map_err(|e| ClinlpError::Tokenizer(e.to_string()))?;
        let ids = encoding.get_ids();
        let position = ids.iter().position(|&id| id == self.mask_id).ok_or_else(|| {
            ClinlpError::Tokenizer(format!("mask token was split by the tokenizer: {sentence:?}"))
        })?;

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let mask = full_attention_mask(ids.len(), &self.device)?;

        // [1, seq_len, vocab] -> [vocab] at the mask position
        let logits = self.model.forward(&input_ids, &mask)?.get(0)?.get(position)?;
        let probs: Vec<f32> = candle_nn::ops::softmax(&logits, D::Minus1)?.to_vec1()?;

        let mut ranked: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .take(top_k)
            .map(|(id, _)| {
                self.tokenizer
                    .decode(&[id as u32], false)
                    .map(|token| token.trim().to_string())
                    .map_err(|e| ClinlpError::Tokenizer(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = DistilBertFiller::load(dir.path(), "<mask>");
        assert!(matches!(result, Err(ClinlpError::ModelLoadError(_))));
    }
}
