//! # Person Sentence Sampler
//!
//! Builds a masked evaluation set from an anonymized corpus: sentences that
//! mention the person marker get it replaced by the mask placeholder, are
//! filtered by length and mask count, and a random subset is kept.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use oorandom::Rand32;
use serde::{Deserialize, Serialize};

use crate::error::{ClinlpError, Result};

/// File name the sample is written to inside the output directory.
pub const SAMPLE_FILE_NAME: &str = "anonymized_sentences.csv";

/// Sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Token marking a redacted person in the corpus.
    pub marker: String,
    /// Placeholder substituted for the marker.
    pub mask: String,
    /// Candidates must be strictly longer than this before masking.
    pub min_raw_length: usize,
    /// Inclusive bounds on the final sentence length.
    pub min_length: usize,
    pub max_length: usize,
    /// Number of sentences drawn.
    pub sample_size: usize,
    /// Fixed seed; `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            marker: String::from("PERSON"),
            mask: String::from("<mask>"),
            min_raw_length: 30,
            min_length: 30,
            max_length: 120,
            sample_size: 40,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }

    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One sampled sentence, as written to the sample table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    #[serde(rename = "sentences")]
    pub sentence: String,
    pub guessed_tokens: u32,
}

impl SentenceRecord {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            guessed_tokens: 0,
        }
    }
}

pub struct PersonSentenceSampler {
    config: SamplerConfig,
}

impl PersonSentenceSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Masked candidates from one line of the corpus.
    pub fn process_line(&self, line: &str) -> Vec<String> {
        let marker = self.config.marker.as_str();
        line.split(". ")
            .filter(|piece| piece.contains(marker) && piece.chars().count() > self.config.min_raw_length)
            .map(|piece| {
                let mut masked = piece.replace(marker, &self.config.mask).trim().to_string();
                if !masked.ends_with('.') {
                    masked.push('.');
                }
                masked
            })
            .collect()
    }

    /// Whether a masked candidate belongs in the pool.
    fn retain(&self, sentence: &str) -> bool {
        let len = sentence.chars().count();
        (self.config.min_length..=self.config.max_length).contains(&len)
            && sentence.matches(self.config.mask.as_str()).count() == 1
    }

    /// All retained candidates of `lines`, in corpus order.
    pub fn candidates<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        lines
            .into_iter()
            .flat_map(|line| self.process_line(line))
            .filter(|sentence| self.retain(sentence))
            .collect()
    }

    /// Read the corpus at `path` and draw the sample.
    pub fn build_dataset(&self, path: impl AsRef<Path>) -> Result<Vec<SentenceRecord>> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mut pool = Vec::new();
        let mut line = String::new();
        // Lines keep their trailing newline, as the splitting rule expects
        while reader.read_line(&mut line)? > 0 {
            pool.extend(self.candidates([line.as_str()]));
            line.clear();
        }
        tracing::info!("{} candidate sentences retained from {}", pool.len(), path.display());
        self.sample(pool)
    }

    /// Draw the sample from in-memory text.
    pub fn build_from_str(&self, text: &str) -> Result<Vec<SentenceRecord>> {
        self.sample(self.candidates(text.split_inclusive('\n')))
    }

    /// Uniform sample without replacement of `min(sample_size, pool)` sentences.
    fn sample(&self, mut pool: Vec<String>) -> Result<Vec<SentenceRecord>> {
        if pool.is_empty() {
            return Err(ClinlpError::NoSentencesRetained);
        }

        let seed = self.config.seed.unwrap_or_else(clock_seed);
        let mut rng = Rand32::new(seed);
        let take = self.config.sample_size.min(pool.len());

        // Partial Fisher-Yates: the first `take` slots end up a uniform draw
        for i in 0..take {
            let j = i + rng.rand_range(0..(pool.len() - i) as u32) as usize;
            pool.swap(i, j);
        }
        pool.truncate(take);

        Ok(pool.into_iter().map(SentenceRecord::new).collect())
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Write records as a `;`-delimited table with a header row.
pub fn write_csv(records: &[SentenceRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path.as_ref())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the `sentences` column of a `;`-delimited table.
pub fn read_sentences(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path.as_ref())?;
    let column = reader
        .headers()?
        .iter()
        .position(|h| h == "sentences")
        .ok_or_else(|| ClinlpError::MissingColumn {
            column: "sentences".into(),
        })?;

    let mut sentences = Vec::new();
    for record in reader.records() {
        let record = record?;
        sentences.push(record.get(column).unwrap_or_default().to_string());
    }
    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded() -> PersonSentenceSampler {
        PersonSentenceSampler::new(SamplerConfig::new().with_seed(7))
    }

    #[test]
    fn test_process_line_example() {
        let line = "PERSON was admitted yesterday with chest pain and fever. Other text.";
        assert_eq!(
            seeded().process_line(line),
            vec!["<mask> was admitted yesterday with chest pain and fever."]
        );
    }

    #[test]
    fn test_station_sentence_keeps_one_mask_and_period() {
        let line = "He met PERSON at the station platform near the old clock tower today.\n";
        let retained = seeded().candidates([line]);
        assert_eq!(
            retained,
            vec!["He met <mask> at the station platform near the old clock tower today."]
        );
        assert_eq!(retained[0].matches("<mask>").count(), 1);
        assert!(!retained[0].ends_with(".."));
    }

    #[test]
    fn test_short_candidates_are_dropped() {
        assert!(seeded().process_line("PERSON slaapt goed. Rest.").is_empty());
    }

    #[test]
    fn test_double_marker_is_not_retained() {
        let line = "PERSON belde met PERSON over de uitslag van gisteren.\n";
        let sampler = seeded();
        assert_eq!(sampler.process_line(line).len(), 1);
        assert!(sampler.candidates([line]).is_empty());
    }

    #[test]
    fn test_overlong_candidate_is_not_retained() {
        let line = format!("PERSON {}", "heel ".repeat(30));
        assert!(seeded().candidates([line.as_str()]).is_empty());
    }

    #[test]
    fn test_sample_bounds_and_invariants() {
        let text: String = (0..60)
            .map(|i| format!("Gesprek nummer {i} gevoerd met PERSON over het beleid. Rest\n"))
            .collect();
        let sample = seeded().build_from_str(&text).unwrap();

        assert_eq!(sample.len(), 40);
        let unique: HashSet<&str> = sample.iter().map(|r| r.sentence.as_str()).collect();
        assert_eq!(unique.len(), 40);
        for record in &sample {
            let len = record.sentence.chars().count();
            assert!((30..=120).contains(&len));
            assert_eq!(record.sentence.matches("<mask>").count(), 1);
            assert_eq!(record.guessed_tokens, 0);
        }
    }

    #[test]
    fn test_small_pool_is_fully_returned() {
        let text = "Gesprek gevoerd met PERSON over het beleid.\nGeen namen hier.\n";
        let sample = seeded().build_from_str(text).unwrap();
        assert_eq!(sample.len(), 1);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let text: String = (0..50)
            .map(|i| format!("Afspraak {i} gemaakt door PERSON voor de controle.\n"))
            .collect();
        let config = SamplerConfig::new().with_seed(42).with_sample_size(5);
        let a = PersonSentenceSampler::new(config.clone()).build_from_str(&text).unwrap();
        let b = PersonSentenceSampler::new(config).build_from_str(&text).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_pool_fails() {
        let result = seeded().build_from_str("Geen enkele naam.\n");
        assert!(matches!(result, Err(ClinlpError::NoSentencesRetained)));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        std::fs::write(&corpus, "Gesprek gevoerd met PERSON over het beleid. Rest\n").unwrap();

        let records = seeded().build_dataset(&corpus).unwrap();
        let table = dir.path().join(SAMPLE_FILE_NAME);
        write_csv(&records, &table).unwrap();

        let written = std::fs::read_to_string(&table).unwrap();
        assert!(written.starts_with("sentences;guessed_tokens\n"));
        assert!(written.contains("Gesprek gevoerd met <mask> over het beleid.;0"));
        assert_eq!(
            read_sentences(&table).unwrap(),
            vec!["Gesprek gevoerd met <mask> over het beleid."]
        );
    }
}
