//! Sentence chunking of anonymized notes.

use std::io::Write;

use crate::error::Result;
use crate::pipeline::SentenceSegmenter;

/// Sentences per chunk when not configured otherwise.
pub const DEFAULT_SENTENCES_PER_CHUNK: usize = 40;

/// Chunking configuration.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Upper bound on sentences in one chunk. Values below 1 are treated as 1.
    pub sentences_per_chunk: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            sentences_per_chunk: DEFAULT_SENTENCES_PER_CHUNK,
        }
    }
}

impl ChunkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sentences_per_chunk(mut self, n: usize) -> Self {
        self.sentences_per_chunk = n;
        self
    }
}

/// An ordered group of sentences from a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sentences: Vec<String>,
}

impl Chunk {
    /// Render as one output line.
    ///
    /// A sentence ending in a period is followed by a single space; any
    /// other sentence is written as is. The line ends with `\n`.
    pub fn render(&self) -> String {
        let mut line = String::new();
        for sentence in &self.sentences {
            line.push_str(sentence);
            if sentence.ends_with('.') {
                line.push(' ');
            }
        }
        line.push('\n');
        line
    }
}

/// The chunks of one note plus the summed sentence length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedNote {
    pub chunks: Vec<Chunk>,
    /// Sum of the character lengths of every sentence.
    pub total_sentence_length: usize,
}

impl ChunkedNote {
    /// Number of sentences across all chunks.
    pub fn sentence_count(&self) -> usize {
        self.chunks.iter().map(|c| c.sentences.len()).sum()
    }
}

/// Splits anonymized text into sentences and groups them into chunks.
pub struct ChunkWriter<S> {
    segmenter: S,
    config: ChunkConfig,
}

impl<S: SentenceSegmenter> ChunkWriter<S> {
    pub fn new(segmenter: S) -> Self {
        Self::with_config(segmenter, ChunkConfig::default())
    }

    pub fn with_config(segmenter: S, config: ChunkConfig) -> Self {
        Self { segmenter, config }
    }

    /// Segment `text` and group the sentences into chunks in document order.
    pub fn segment_and_chunk(&self, text: &str) -> Result<ChunkedNote> {
        let sentences = self.segmenter.sentences(text)?;
        let total_sentence_length = sentences.iter().map(|s| s.chars().count()).sum();

        let size = self.config.sentences_per_chunk.max(1);
        let chunks = sentences
            .chunks(size)
            .map(|group| Chunk {
                sentences: group.to_vec(),
            })
            .collect();

        Ok(ChunkedNote {
            chunks,
            total_sentence_length,
        })
    }

    /// Write every chunk of an already chunked note to `out`.
    pub fn write_note<W: Write>(&self, note: &ChunkedNote, out: &mut W) -> Result<()> {
        for chunk in &note.chunks {
            out.write_all(chunk.render().as_bytes())?;
        }
        Ok(())
    }

    /// Segment, chunk and write `text`; returns the summed sentence length.
    pub fn write_chunks<W: Write>(&self, text: &str, out: &mut W) -> Result<usize> {
        let note = self.segment_and_chunk(text)?;
        self.write_note(&note, out)?;
        Ok(note.total_sentence_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RuleSegmenter;

    /// Every line of input is a sentence.
    struct Lines;

    impl SentenceSegmenter for Lines {
        fn sentences(&self, text: &str) -> Result<Vec<String>> {
            Ok(text.lines().map(str::to_string).collect())
        }
    }

    #[test]
    fn test_three_sentences_one_chunk() {
        let writer = ChunkWriter::new(RuleSegmenter::new());
        let mut out = Vec::new();
        let total = writer
            .write_chunks("Sentence one. Sentence two. Sentence three.", &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Sentence one. Sentence two. Sentence three. \n"
        );
        assert_eq!(total, 13 + 13 + 15);
    }

    #[test]
    fn test_chunk_bound_and_order() {
        let text: Vec<String> = (0..95).map(|i| format!("s{i}")).collect();
        let writer = ChunkWriter::new(Lines);
        let note = writer.segment_and_chunk(&text.join("\n")).unwrap();

        let sizes: Vec<usize> = note.chunks.iter().map(|c| c.sentences.len()).collect();
        assert_eq!(sizes, vec![40, 40, 15]);

        let flattened: Vec<String> = note
            .chunks
            .into_iter()
            .flat_map(|c| c.sentences)
            .collect();
        assert_eq!(flattened, text);
    }

    #[test]
    fn test_sentence_without_period_gets_no_space() {
        let chunk = Chunk {
            sentences: vec!["Klachten?".into(), "Geen.".into(), "Einde".into()],
        };
        assert_eq!(chunk.render(), "Klachten?Geen. Einde\n");
    }

    #[test]
    fn test_configured_chunk_size() {
        let config = ChunkConfig::new().with_sentences_per_chunk(2);
        let writer = ChunkWriter::with_config(Lines, config);
        let mut out = Vec::new();
        writer.write_chunks("a.\nb.\nc.", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a. b. \nc. \n");
    }

    #[test]
    fn test_empty_text_writes_nothing() {
        let writer = ChunkWriter::new(RuleSegmenter::new());
        let mut out = Vec::new();
        assert_eq!(writer.write_chunks("   ", &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_lengths_count_characters() {
        let writer = ChunkWriter::new(Lines);
        let note = writer.segment_and_chunk("één.").unwrap();
        assert_eq!(note.total_sentence_length, 4);
        assert_eq!(note.sentence_count(), 1);
    }
}
