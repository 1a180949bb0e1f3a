//! # Mask Prediction
//!
//! Asks a masked-language model to fill the mask of each sampled sentence and
//! tallies how often each token was proposed.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};

/// Anything that can propose completions for a single mask in a sentence.
pub trait MaskFiller {
    /// The `top_k` most likely tokens for the mask, best first.
    fn fill(&self, sentence: &str, top_k: usize) -> clinlp_core::Result<Vec<String>>;
}

impl<T: MaskFiller + ?Sized> MaskFiller for &T {
    fn fill(&self, sentence: &str, top_k: usize) -> clinlp_core::Result<Vec<String>> {
        (**self).fill(sentence, top_k)
    }
}

impl<T: MaskFiller + ?Sized> MaskFiller for Box<T> {
    fn fill(&self, sentence: &str, top_k: usize) -> clinlp_core::Result<Vec<String>> {
        (**self).fill(sentence, top_k)
    }
}

#[derive(Debug, Clone)]
pub struct MaskConfig {
    /// Completions requested per sentence.
    pub top_k: usize,
    /// The model's mask token.
    pub mask_token: String,
    /// The placeholder the sampled sentences carry. Rewritten to
    /// `mask_token` before filling.
    pub placeholder: String,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            top_k: 40,
            mask_token: String::from("<mask>"),
            placeholder: String::from("<mask>"),
        }
    }
}

impl MaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_mask_token(mut self, token: impl Into<String>) -> Self {
        self.mask_token = token.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// `sentence` with the sample placeholder swapped for the model's mask token.
    pub fn model_input(&self, sentence: &str) -> String {
        if self.placeholder.is_empty() || self.placeholder == self.mask_token {
            sentence.to_string()
        } else {
            sentence.replace(&self.placeholder, &self.mask_token)
        }
    }
}

/// A sentence and the tokens predicted for its mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub sentence: String,
    pub predictions: Vec<String>,
}

/// One row of the frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionCount {
    #[serde(rename = "Prediction")]
    pub prediction: String,
    #[serde(rename = "times predicted")]
    pub count: usize,
}

pub struct MaskPredictor<F> {
    filler: F,
    config: MaskConfig,
}

impl<F: MaskFiller> MaskPredictor<F> {
    pub fn new(filler: F, config: MaskConfig) -> Self {
        Self { filler, config }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Fill the mask of every sentence.
    ///
    /// # Errors
    ///
    /// `TrainerError::NoSentences` for an empty batch; filler errors propagate.
    pub fn predict(&self, sentences: &[String]) -> Result<Vec<PredictionRecord>> {
        if sentences.is_empty() {
            return Err(TrainerError::NoSentences);
        }
        tracing::info!("Making predictions for {} sentences", sentences.len());

        sentences
            .iter()
            .map(|sentence| {
                let input = self.config.model_input(sentence);
                let predictions = self.filler.fill(&input, self.config.top_k)?;
                Ok(PredictionRecord {
                    sentence: sentence.clone(),
                    predictions,
                })
            })
            .collect()
    }
}

/// Count every predicted token, most frequent first.
///
/// Tokens with equal counts keep the order in which they were first seen.
pub fn tally(records: &[PredictionRecord]) -> Vec<PredictionCount> {
    let mut counts: Vec<PredictionCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for prediction in records.iter().flat_map(|r| &r.predictions) {
        match positions.get(prediction.as_str()) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                positions.insert(prediction, counts.len());
                counts.push(PredictionCount {
                    prediction: prediction.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Write the frequency table as a `;`-delimited file.
pub fn write_tally(counts: &[PredictionCount], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    for count in counts {
        writer.serialize(count)?;
    }
    writer.flush()?;
    tracing::info!("Predictions saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinlp_core::ClinlpError;

    /// Proposes tokens from a fixed list, rotated by sentence length.
    struct Rotating(Vec<&'static str>);

    impl MaskFiller for Rotating {
        fn fill(&self, sentence: &str, top_k: usize) -> clinlp_core::Result<Vec<String>> {
            let offset = sentence.len() % self.0.len();
            Ok(self
                .0
                .iter()
                .cycle()
                .skip(offset)
                .take(top_k.min(self.0.len()))
                .map(|t| t.to_string())
                .collect())
        }
    }

    struct Broken;

    impl MaskFiller for Broken {
        fn fill(&self, _sentence: &str, _top_k: usize) -> clinlp_core::Result<Vec<String>> {
            Err(ClinlpError::InferenceError("out of memory".into()))
        }
    }

    fn record(predictions: &[&str]) -> PredictionRecord {
        PredictionRecord {
            sentence: String::new(),
            predictions: predictions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_tally_example() {
        let counts = tally(&[record(&["Jan", "Piet"]), record(&["Piet", "Klaas"])]);
        let rows: Vec<(&str, usize)> = counts
            .iter()
            .map(|c| (c.prediction.as_str(), c.count))
            .collect();
        assert_eq!(rows, vec![("Piet", 2), ("Jan", 1), ("Klaas", 1)]);
    }

    #[test]
    fn test_tally_sums_to_predictions() {
        let sentences: Vec<String> = (0..7).map(|i| format!("zin {i} met <mask>.{}", "x".repeat(i))).collect();
        let filler = Rotating(vec!["Jan", "Piet", "Klaas", "Marie", "Anna"]);
        let predictor = MaskPredictor::new(filler, MaskConfig::new().with_top_k(3));

        let records = predictor.predict(&sentences).unwrap();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.predictions.len() == 3));

        let counts = tally(&records);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 7 * 3);
        assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_empty_batch_fails() {
        let predictor = MaskPredictor::new(Rotating(vec!["Jan"]), MaskConfig::new());
        assert!(matches!(predictor.predict(&[]), Err(TrainerError::NoSentences)));
    }

    #[test]
    fn test_filler_errors_propagate() {
        let predictor = MaskPredictor::new(Broken, MaskConfig::new());
        let result = predictor.predict(&["<mask> is ziek.".to_string()]);
        assert!(matches!(
            result,
            Err(TrainerError::Core(ClinlpError::InferenceError(_)))
        ));
    }

    /// Echoes back the sentence it was asked to fill.
    struct Echo;

    impl MaskFiller for Echo {
        fn fill(&self, sentence: &str, _top_k: usize) -> clinlp_core::Result<Vec<String>> {
            Ok(vec![sentence.to_string()])
        }
    }

    #[test]
    fn test_placeholder_rewritten_to_model_mask() {
        let config = MaskConfig::new().with_mask_token("[MASK]");
        let predictor = MaskPredictor::new(Echo, config);
        let records = predictor
            .predict(&["He met <mask> at the station.".to_string()])
            .unwrap();
        assert_eq!(records[0].sentence, "He met <mask> at the station.");
        assert_eq!(records[0].predictions, vec!["He met [MASK] at the station."]);
    }

    #[test]
    fn test_matching_placeholder_left_alone() {
        let predictor = MaskPredictor::new(Echo, MaskConfig::new());
        let records = predictor.predict(&["Gezien door <mask>.".to_string()]).unwrap();
        assert_eq!(records[0].predictions, vec!["Gezien door <mask>."]);
    }

    #[test]
    fn test_write_tally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        let counts = tally(&[record(&["Jan", "Jan", "Piet"])]);
        write_tally(&counts, &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Prediction;times predicted\nJan;2\nPiet;1\n"
        );
    }
}
