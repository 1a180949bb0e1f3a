//! # clinlp Trainer
//!
//! Training and evaluation workflows on top of `clinlp-core`: the CoNLL-2002
//! NER runner with its perceptron tagger and metrics, masked-LM evaluation on
//! sampled person sentences, and the line dataset used for LM pre-training.

pub mod cli;
pub mod data;
pub mod error;
pub mod mask;
pub mod metrics;
pub mod mlm;
pub mod model;
pub mod ner;
pub mod tags;
pub mod trainer;

pub use data::{HfTokenEncoder, LabeledSentence, LineDataset, TokenEncoder, load_conll_dataset};
pub use error::{Result, TrainerError};
pub use mask::{MaskConfig, MaskFiller, MaskPredictor, PredictionCount, PredictionRecord, tally};
pub use metrics::EvalReport;
pub use mlm::DistilBertFiller;
pub use model::{PerceptronTagger, SequenceLabeler};
pub use ner::{ModelType, NerConfig, NerRunner};
pub use tags::ConllTag;
pub use trainer::Trainer;
