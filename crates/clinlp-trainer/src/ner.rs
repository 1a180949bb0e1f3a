//! # NER Runner
//!
//! Trains a sequence labeler on a CoNLL-2002 training file and evaluates it
//! on a held-out file, reporting entity-level scores.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::data::{LabeledSentence, load_conll_dataset};
use crate::error::TrainerError;
use crate::metrics::EvalReport;
use crate::model::{PerceptronTagger, SequenceLabeler};
use crate::tags::ConllTag;
use crate::trainer::{DEFAULT_EPOCHS, DEFAULT_SEED, Trainer};

/// The sequence labelers that can be trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Feature-based structured perceptron with constrained Viterbi decoding.
    Perceptron,
}

impl FromStr for ModelType {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "perceptron" | "crf" => Ok(ModelType::Perceptron),
            _ => Err(TrainerError::UnsupportedModelType(s.to_string())),
        }
    }
}

/// NER run configuration.
#[derive(Debug, Clone)]
pub struct NerConfig {
    /// Log the per-type classification report after evaluation.
    pub classification_report: bool,
    pub epochs: usize,
    /// Seed of the example shuffle.
    pub seed: u64,
    /// Where to write the trained weights, if anywhere.
    pub save_path: Option<PathBuf>,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            classification_report: true,
            epochs: DEFAULT_EPOCHS,
            seed: DEFAULT_SEED,
            save_path: None,
        }
    }
}

impl NerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_classification_report(mut self, enabled: bool) -> Self {
        self.classification_report = enabled;
        self
    }

    /// The label list every data file must stay within.
    pub fn labels(&self) -> &'static [ConllTag] {
        ConllTag::all_tags()
    }
}

/// Train-then-evaluate driver for the CoNLL task.
pub struct NerRunner {
    model_type: String,
    model_path: PathBuf,
    training_data: PathBuf,
    evaluation_data: PathBuf,
    config: NerConfig,
}

impl NerRunner {
    pub fn new(
        model_type: impl Into<String>,
        model_path: impl Into<PathBuf>,
        training_data: impl Into<PathBuf>,
        evaluation_data: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            model_path: model_path.into(),
            training_data: training_data.into(),
            evaluation_data: evaluation_data.into(),
            config: NerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fit on the training file, evaluate on the evaluation file.
    pub fn run(&self) -> anyhow::Result<EvalReport> {
        let model_type: ModelType = self.model_type.parse()?;
        tracing::info!(
            "Running {:?} with labels {}",
            model_type,
            self.config
                .labels()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let train = load_conll_dataset(&self.training_data).with_context(|| {
            format!("failed to load training data from {}", self.training_data.display())
        })?;
        let eval = load_conll_dataset(&self.evaluation_data).with_context(|| {
            format!("failed to load evaluation data from {}", self.evaluation_data.display())
        })?;

        let mut labeler = self.build_labeler(model_type)?;
        Trainer::new(self.config.epochs, self.config.seed).train(labeler.as_mut(), &train);

        if let Some(path) = &self.config.save_path {
            labeler
                .save(path)
                .with_context(|| format!("failed to save model to {}", path.display()))?;
        }

        let report = evaluate(labeler.as_ref(), &eval);
        if self.config.classification_report {
            tracing::info!("Classification report\n{report}");
        }
        Ok(report)
    }

    /// A fresh labeler, or one initialised from `model_path` when it exists.
    fn build_labeler(&self, model_type: ModelType) -> anyhow::Result<Box<dyn SequenceLabeler>> {
        match model_type {
            ModelType::Perceptron => {
                if self.model_path.is_file() {
                    tracing::info!("Fine-tuning from {}", self.model_path.display());
                    let model = PerceptronTagger::load(&self.model_path).with_context(|| {
                        format!("failed to load model from {}", self.model_path.display())
                    })?;
                    Ok(Box::new(model))
                } else {
                    tracing::info!(
                        "No model at {}, training from scratch",
                        self.model_path.display()
                    );
                    Ok(Box::new(PerceptronTagger::new()))
                }
            }
        }
    }
}

/// Tag every sentence of `data` and score against its gold tags.
pub fn evaluate<L: SequenceLabeler + ?Sized>(labeler: &L, data: &[LabeledSentence]) -> EvalReport {
    let gold: Vec<Vec<ConllTag>> = data.iter().map(|s| s.tags.clone()).collect();
    let predicted: Vec<Vec<ConllTag>> = data.iter().map(|s| labeler.predict(&s.tokens)).collect();
    EvalReport::evaluate(&gold, &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRAIN: &str = "-DOCSTART- -DOCSTART- O\n\n\
        Jan B-PER\nPeeters I-PER\nwoont O\nin O\nGent B-LOC\n\n\
        Marie B-PER\nwerkt O\nbij O\nPhilips B-ORG\n\n\
        Hij O\nreist O\nnaar O\nBrussel B-LOC\n";
    const EVAL: &str = "Jan B-PER\nwerkt O\nin O\nGent B-LOC\n";

    fn write_data(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        let train = dir.join("ned.train");
        let eval = dir.join("ned.testb");
        fs::write(&train, TRAIN).unwrap();
        fs::write(&eval, EVAL).unwrap();
        (train, eval)
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!("crf".parse::<ModelType>().unwrap(), ModelType::Perceptron);
        assert_eq!("Perceptron".parse::<ModelType>().unwrap(), ModelType::Perceptron);
        assert!(matches!(
            "bert".parse::<ModelType>(),
            Err(TrainerError::UnsupportedModelType(_))
        ));
    }

    #[test]
    fn test_run_trains_and_evaluates() {
        let dir = tempfile::tempdir().unwrap();
        let (train, eval) = write_data(dir.path());
        let saved = dir.path().join("model.json");

        let config = NerConfig::new().with_epochs(20).with_save_path(&saved);
        let report = NerRunner::new("perceptron", dir.path().join("missing.json"), &train, &eval)
            .with_config(config)
            .run()
            .unwrap();

        assert_eq!(report.tokens, 4);
        assert_eq!(report.micro.support, 2);
        assert!(saved.exists());

        // A second run warm-starts from the saved weights
        let report = NerRunner::new("crf", &saved, &train, &eval)
            .with_config(NerConfig::new().with_epochs(1))
            .run()
            .unwrap();
        assert_eq!(report.tokens, 4);
    }

    #[test]
    fn test_unknown_model_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (train, eval) = write_data(dir.path());
        let err = NerRunner::new("bert", "GroNLP/bert-base-dutch-cased", train, eval)
            .run()
            .unwrap_err();
        assert!(err.downcast_ref::<TrainerError>().is_some());
    }

    #[test]
    fn test_unknown_label_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (train, _) = write_data(dir.path());
        let eval = dir.path().join("bad.txt");
        fs::write(&eval, "maart B-DATE\n").unwrap();

        let err = NerRunner::new("crf", dir.path().join("none"), train, eval)
            .run()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrainerError>(),
            Some(TrainerError::UnknownLabel { .. })
        ));
    }
}
