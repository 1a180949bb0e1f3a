//! # clinlp
//!
//! Toolkit for a Dutch clinical-NLP research pipeline.
//!
//! This crate re-exports [`clinlp_core`] (anonymization, corpus gathering and
//! sentence sampling) and [`clinlp_trainer`] (NER training and evaluation,
//! masked-LM prediction, line datasets).
//!
//! ```rust
//! use clinlp::{NoteAnonymizer, RuleRecognizer};
//!
//! let anonymizer = NoteAnonymizer::new(RuleRecognizer::new().unwrap());
//! let note = anonymizer.anonymize("Gezien door dr. Jansen in Utrecht.").unwrap();
//! assert_eq!(note, "Gezien door dr. PERSON in GPE.");
//! ```

pub use clinlp_core::*;

pub use clinlp_trainer as trainer;
pub use clinlp_trainer::{
    ConllTag, EvalReport, MaskFiller, MaskPredictor, NerConfig, NerRunner, SequenceLabeler,
    TokenEncoder, TrainerError,
};
