//! # Corpus Gathering
//!
//! Turns a table of clinical notes into an anonymized, sentence-chunked text
//! corpus for language-model pre-training.

pub mod builder;
pub mod chunk;
pub mod stats;

pub use builder::{CorpusBuilder, CorpusConfig, RowOutcome, RunReport};
pub use chunk::{Chunk, ChunkConfig, ChunkWriter, ChunkedNote};
pub use stats::{CorpusStats, format_elapsed};
