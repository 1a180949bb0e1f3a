//! # Neural Entity Recognizer
//!
//! DistilBERT token-classification model run with candle. Word-piece labels
//! are merged back into character spans through the tokenizer offsets.

use std::path::{Path, PathBuf};

use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use tokenizers::Tokenizer as HfTokenizer;

use crate::entity::{EntityCategory, EntitySpan};
use crate::error::{ClinlpError, Result};
use crate::model::{TokenClassifier, full_attention_mask, read_configs};
use crate::pipeline::{EntityRecognizer, resolve_overlaps};

/// Neural entity recognizer backed by a token-classification checkpoint.
pub struct NeuralRecognizer {
    tokenizer: HfTokenizer,
    model: TokenClassifier,
    labels: Vec<String>,
    cls_id: u32,
    sep_id: u32,
    window: usize,
    device: Device,
}

impl NeuralRecognizer {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` from `model_dir`.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let device = Device::Cpu;

        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"))?;
        let cls_id = special_token_id(&tokenizer, &["[CLS]", "<s>"])?;
        let sep_id = special_token_id(&tokenizer, &["[SEP]", "</s>"])?;

        let (config, head) =
            read_configs(&model_dir.join("config.json")).map_err(ClinlpError::ModelLoadError)?;
        let labels = head.labels().map_err(ClinlpError::ModelLoadError)?;
        if labels.is_empty() {
            return Err(ClinlpError::ModelLoadError(
                "config.json has no id2label mapping".into(),
            ));
        }

        let weights = require_file(model_dir.join("model.safetensors"))?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device) }?;
        let model = TokenClassifier::load(vb, &config, &head)?;

        tracing::info!(
            "Loaded token classifier from {} ({} labels)",
            model_dir.display(),
            labels.len()
        );

        Ok(Self {
            tokenizer,
            model,
            labels,
            cls_id,
            sep_id,
            window: head.max_position_embeddings.saturating_sub(2).max(1),
            device,
        })
    }

    /// Label index per word piece for one window of ids.
    fn label_window(&self, ids: &[u32]) -> Result<Vec<usize>> {
        let mut input = Vec::with_capacity(ids.len() + 2);
        input.push(self.cls_id);
        input.extend_from_slice(ids);
        input.push(self.sep_id);

        let input_ids = Tensor::new(input.as_slice(), &self.device)?.unsqueeze(0)?;
        let mask = full_attention_mask(input.len(), &self.device)?;

        // [1, seq_len, num_labels] -> [seq_len]
        let predicted: Vec<u32> = self
            .model
            .forward(&input_ids, &mask)?
            .squeeze(0)?
            .argmax(D::Minus1)?
            .to_vec1()?;

        // Drop the [CLS]/[SEP] positions
        Ok(predicted[1..predicted.len() - 1]
            .iter()
            .map(|&p| p as usize)
            .collect())
    }
}

impl EntityRecognizer for NeuralRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ClinlpError::Tokenizer(e.to_string()))?;
        let ids = encoding.get_ids();
        let offsets = encoding.get_offsets();

        let mut tags = Vec::with_capacity(ids.len());
        for window in ids.chunks(self.window) {
            tags.extend(self.label_window(window)?);
        }

        let labels: Vec<&str> = tags
            .iter()
            .map(|&t| self.labels.get(t).map(String::as_str).unwrap_or("O"))
            .collect();

        Ok(resolve_overlaps(assemble_spans(text, offsets, &labels)))
    }
}

/// Merge per-piece BIO labels into character spans.
///
/// A piece continues the open span when it is tagged `I-` of the same type,
/// or carries the exact same bare label (schemes without prefixes).
pub fn assemble_spans(text: &str, offsets: &[(usize, usize)], labels: &[&str]) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, usize, &str)> = None;

    for (&(start, end), &label) in offsets.iter().zip(labels) {
        // Special tokens carry empty offsets
        if start == end {
            continue;
        }

        let (prefix, bare) = match label.split_once('-') {
            Some((p @ ("B" | "I"), bare)) => (Some(p), bare),
            _ => (None, label),
        };

        let continues = match (&open, prefix) {
            (Some((_, _, current)), Some("I")) => *current == bare,
            (Some((_, _, current)), None) => *current == bare && bare != "O",
            _ => false,
        };

        if continues {
            if let Some(span) = open.as_mut() {
                span.1 = end;
            }
            continue;
        }

        if let Some((s, e, current)) = open.take() {
            spans.push(EntitySpan::new(s, e, EntityCategory::from_model_label(current)));
        }
        if bare != "O" {
            open = Some((start, end, bare));
        }
    }

    if let Some((s, e, current)) = open {
        spans.push(EntitySpan::new(s, e, EntityCategory::from_model_label(current)));
    }

    spans.retain(|span| span.validate(text).is_ok());
    spans
}

fn load_tokenizer(path: &Path) -> Result<HfTokenizer> {
    let path = require_file(path.to_path_buf())?;
    HfTokenizer::from_file(&path).map_err(|e| ClinlpError::Tokenizer(e.to_string()))
}

fn special_token_id(tokenizer: &HfTokenizer, candidates: &[&str]) -> Result<u32> {
    candidates
        .iter()
        .find_map(|t| tokenizer.token_to_id(t))
        .ok_or_else(|| {
            ClinlpError::Tokenizer(format!("tokenizer has none of the tokens {candidates:?}"))
        })
}

fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ClinlpError::ModelLoadError(format!(
            "{} not found",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_merges_pieces() {
        let text = "Dr. Smithson visited Amsterdam";
        // "Dr", ".", "Smith", "##son", "visited", "Amsterdam"
        let offsets = [(0, 2), (2, 3), (4, 9), (9, 12), (13, 20), (21, 30)];
        let labels = ["O", "O", "B-PER", "I-PER", "O", "B-LOC"];
        let spans = assemble_spans(text, &offsets, &labels);
        assert_eq!(
            spans,
            vec![
                EntitySpan::new(4, 12, EntityCategory::Person),
                EntitySpan::new(21, 30, EntityCategory::Gpe),
            ]
        );
    }

    #[test]
    fn test_assemble_breaks_on_type_change() {
        let text = "Jan Utrecht";
        let offsets = [(0, 3), (4, 11)];
        let labels = ["B-PER", "I-LOC"];
        let spans = assemble_spans(text, &offsets, &labels);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].category, EntityCategory::Gpe);
    }

    #[test]
    fn test_assemble_unprefixed_labels() {
        let text = "op 1 mei";
        let offsets = [(0, 2), (3, 4), (5, 8)];
        let labels = ["O", "DATE", "DATE"];
        let spans = assemble_spans(text, &offsets, &labels);
        assert_eq!(spans, vec![EntitySpan::new(3, 8, EntityCategory::Date)]);
    }

    #[test]
    fn test_assemble_skips_special_tokens() {
        let text = "Jan";
        let offsets = [(0, 0), (0, 3), (0, 0)];
        let labels = ["B-PER", "B-PER", "I-PER"];
        let spans = assemble_spans(text, &offsets, &labels);
        assert_eq!(spans, vec![EntitySpan::new(0, 3, EntityCategory::Person)]);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = NeuralRecognizer::load(dir.path());
        assert!(matches!(result, Err(ClinlpError::ModelLoadError(_))));
    }
}
