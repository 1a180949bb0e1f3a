//! Summary statistics of a corpus run.

use std::fmt;
use std::time::Duration;

use crate::error::{ClinlpError, Result};

/// Chunk lengths above this many characters are counted as over the limit.
pub const DEFAULT_LENGTH_LIMIT: usize = 512;

/// Statistics over the per-note chunk lengths of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub average_length: f64,
    pub chunk_count: usize,
    pub over_limit: usize,
    pub length_limit: usize,
    pub max_length: usize,
    pub note_count: usize,
    pub elapsed: Duration,
}

impl CorpusStats {
    /// Compute statistics from the recorded lengths.
    ///
    /// # Errors
    ///
    /// `ClinlpError::NoChunksProduced` when `lengths` is empty.
    pub fn from_lengths(
        lengths: &[usize],
        note_count: usize,
        length_limit: usize,
        elapsed: Duration,
    ) -> Result<Self> {
        let max_length = *lengths.iter().max().ok_or(ClinlpError::NoChunksProduced)?;
        let total: usize = lengths.iter().sum();

        Ok(Self {
            average_length: total as f64 / lengths.len() as f64,
            chunk_count: lengths.len(),
            over_limit: lengths.iter().filter(|&&l| l > length_limit).count(),
            length_limit,
            max_length,
            note_count,
            elapsed,
        })
    }
}

impl fmt::Display for CorpusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average length per chunk: {:?}", self.average_length)?;
        writeln!(f, "Total amount of chunks: {}", self.chunk_count)?;
        writeln!(
            f,
            "Amount of chunks larger than {}: {}",
            self.length_limit, self.over_limit
        )?;
        writeln!(f, "Largest length of chunk: {}", self.max_length)?;
        writeln!(f, "Amount of notes: {}", self.note_count)?;
        write!(f, "Processing time: {}", format_elapsed(self.elapsed))
    }
}

/// Format a duration as `HH:MM:SS.ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let centis = (elapsed.as_secs_f64() * 100.0).round() as u64;
    let hours = centis / 360_000;
    let minutes = centis / 6_000 % 60;
    let seconds = centis % 6_000;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        hours,
        minutes,
        seconds / 100,
        seconds % 100
    )
}
