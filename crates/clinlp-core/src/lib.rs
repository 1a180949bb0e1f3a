//! # clinlp Core
//!
//! Building blocks for Dutch clinical-NLP corpora: entity recognition and
//! redaction of notes, sentence chunking into a pre-training corpus, and
//! sampling of masked person sentences for evaluation.
//!
//! ## Quick Start
//!
//! ```rust
//! use clinlp_core::anonymize::NoteAnonymizer;
//! use clinlp_core::pipeline::RuleRecognizer;
//!
//! let anonymizer = NoteAnonymizer::new(RuleRecognizer::new().unwrap());
//! let note = anonymizer.anonymize("Dr. Smith visited Amsterdam on 2020-01-01.").unwrap();
//!
//! assert_eq!(note, "Dr. PERSON visited GPE on DATE.");
//! ```
pub mod anonymize;
pub mod corpus;
pub mod entity;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sampler;

// Re-export primary API
pub use anonymize::{AnonymizerConfig, NoteAnonymizer};
pub use corpus::{
    Chunk, ChunkConfig, ChunkWriter, ChunkedNote, CorpusBuilder, CorpusConfig, CorpusStats,
    RowOutcome, RunReport,
};
pub use entity::{EntityCategory, EntitySpan};
pub use error::{ClinlpError, Result};
pub use pipeline::{
    EntityRecognizer, NeuralRecognizer, RuleRecognizer, RuleRecognizerConfig, RuleSegmenter,
    SentenceSegmenter,
};
pub use sampler::{PersonSentenceSampler, SamplerConfig, SentenceRecord};
