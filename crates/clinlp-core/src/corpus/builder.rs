//! # Corpus Builder
//!
//! Reads notes from a comma-separated table, anonymizes and chunks each one,
//! and appends the chunks to a text corpus. Every row yields a [`RowOutcome`]
//! so a bad note never stops the run.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::anonymize::NoteAnonymizer;
use crate::corpus::chunk::{ChunkWriter, ChunkedNote};
use crate::corpus::stats::{CorpusStats, DEFAULT_LENGTH_LIMIT};
use crate::error::{ClinlpError, Result};
use crate::pipeline::{EntityRecognizer, SentenceSegmenter};

/// Configuration for a corpus run.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Header name of the column holding the note text.
    pub text_column: String,
    /// Chunk length above which a chunk is reported as over the limit.
    pub length_limit: usize,
    /// Field delimiter of the input table.
    pub delimiter: u8,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            text_column: String::from("text"),
            length_limit: DEFAULT_LENGTH_LIMIT,
            delimiter: b',',
        }
    }
}

impl CorpusConfig {
    /// Create a configuration reading notes from `text_column`.
    pub fn new(text_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
            ..Self::default()
        }
    }

    pub fn with_length_limit(mut self, limit: usize) -> Self {
        self.length_limit = limit;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// What happened to one input row.
#[derive(Debug)]
pub enum RowOutcome {
    /// The note was anonymized and its chunks were written.
    Written {
        /// 0-based data row index.
        index: usize,
        sentences: usize,
        chunks: usize,
        /// Summed sentence length of the note.
        length: usize,
    },
    /// The note was skipped.
    Failed { index: usize, error: ClinlpError },
}

impl RowOutcome {
    pub fn index(&self) -> usize {
        match self {
            RowOutcome::Written { index, .. } | RowOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, RowOutcome::Written { .. })
    }
}

/// Outcomes of a whole run.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<RowOutcome>,
    /// Data rows read, including the failed ones.
    pub rows_read: usize,
    pub elapsed: Duration,
    pub length_limit: usize,
}

impl RunReport {
    /// One length entry per written note, in row order.
    pub fn lengths(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                RowOutcome::Written { length, .. } => Some(*length),
                RowOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Lines appended to the corpus file.
    pub fn lines_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                RowOutcome::Written { chunks, .. } => *chunks,
                RowOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &ClinlpError)> {
        self.outcomes.iter().filter_map(|o| match o {
            RowOutcome::Failed { index, error } => Some((*index, error)),
            RowOutcome::Written { .. } => None,
        })
    }

    pub fn failed_rows(&self) -> usize {
        self.failures().count()
    }

    /// Corpus statistics of the run.
    ///
    /// # Errors
    ///
    /// `ClinlpError::NoChunksProduced` when no note was written.
    pub fn stats(&self) -> Result<CorpusStats> {
        CorpusStats::from_lengths(
            &self.lengths(),
            self.rows_read,
            self.length_limit,
            self.elapsed,
        )
    }
}

/// Drives anonymization and chunking over a table of notes.
pub struct CorpusBuilder<R, S> {
    anonymizer: NoteAnonymizer<R>,
    chunker: ChunkWriter<S>,
    config: CorpusConfig,
}

impl<R, S> CorpusBuilder<R, S>
where
    R: EntityRecognizer,
    S: SentenceSegmenter,
{
    pub fn new(anonymizer: NoteAnonymizer<R>, chunker: ChunkWriter<S>, config: CorpusConfig) -> Self {
        Self {
            anonymizer,
            chunker,
            config,
        }
    }

    /// Process the table at `input_path`, appending chunks to `output_path`.
    ///
    /// The output file is created if missing and always opened for append.
    pub fn process_data(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<RunReport> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        tracing::info!(
            "Gathering corpus from {} into {}",
            input_path.display(),
            output_path.display()
        );

        let input = File::open(input_path)?;
        let output = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)?;
        let mut writer = BufWriter::new(output);

        let report = self.process_reader(input, &mut writer);
        // Flush whatever was written, even when the run failed part way
        let flushed = writer.flush();
        let report = report?;
        flushed?;
        Ok(report)
    }

    /// Process a table from any reader, appending chunks to `out`.
    ///
    /// # Errors
    ///
    /// A missing text column or an unreadable header fails before any row is
    /// processed. Write errors on `out` abort the run. Row-level problems are
    /// recorded as [`RowOutcome::Failed`].
    pub fn process_reader<I: Read, W: Write>(&self, input: I, out: &mut W) -> Result<RunReport> {
        let start = Instant::now();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .from_reader(input);

        let column = reader
            .headers()?
            .iter()
            .position(|h| h == self.config.text_column)
            .ok_or_else(|| ClinlpError::MissingColumn {
                column: self.config.text_column.clone(),
            })?;

        let mut outcomes = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let outcome = match record
                .map_err(ClinlpError::from)
                .and_then(|record| self.prepare_note(&record, column))
            {
                Ok(note) => {
                    self.chunker.write_note(&note, out)?;
                    tracing::debug!(
                        "Row {index}: {} sentences in {} chunks",
                        note.sentence_count(),
                        note.chunks.len()
                    );
                    RowOutcome::Written {
                        index,
                        sentences: note.sentence_count(),
                        chunks: note.chunks.len(),
                        length: note.total_sentence_length,
                    }
                }
                Err(error) => {
                    tracing::error!("Error processing row {index}: {}", error_chain(&error));
                    RowOutcome::Failed { index, error }
                }
            };
            outcomes.push(outcome);
        }

        let report = RunReport {
            rows_read: outcomes.len(),
            outcomes,
            elapsed: start.elapsed(),
            length_limit: self.config.length_limit,
        };
        tracing::info!(
            "Processed {} rows: {} lines written, {} rows failed",
            report.rows_read,
            report.lines_written(),
            report.failed_rows()
        );
        Ok(report)
    }

    fn prepare_note(&self, record: &csv::StringRecord, column: usize) -> Result<ChunkedNote> {
        let text = record.get(column).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ClinlpError::EmptyInput);
        }
        let anonymized = self.anonymizer.anonymize(text)?;
        self.chunker.segment_and_chunk(&anonymized)
    }
}

/// Render an error followed by each of its sources.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
