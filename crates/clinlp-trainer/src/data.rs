//! Data loading: CoNLL-formatted NER files and line-by-line LM text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use clinlp_core::ClinlpError;
use tokenizers::Tokenizer;

use crate::error::{Result, TrainerError};
use crate::tags::ConllTag;

/// One sentence of a labeled NER file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSentence {
    pub tokens: Vec<String>,
    pub tags: Vec<ConllTag>,
}

impl LabeledSentence {
    pub fn new(tokens: Vec<String>, tags: Vec<ConllTag>) -> Self {
        Self { tokens, tags }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Load a CoNLL-formatted file.
///
/// One token per line with the word in the first column and the tag in the
/// last; blank lines separate sentences and `-DOCSTART-` lines are skipped.
pub fn load_conll_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledSentence>> {
    let reader = BufReader::new(File::open(path)?);
    parse_conll(reader)
}

/// Parse CoNLL lines from any reader.
pub fn parse_conll<R: BufRead>(reader: R) -> Result<Vec<LabeledSentence>> {
    let mut sentences = Vec::new();
    let mut tokens = Vec::new();
    let mut tags = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let line_number = idx + 1;

        if line.is_empty() || line.starts_with("-DOCSTART-") {
            if !tokens.is_empty() {
                sentences.push(LabeledSentence::new(
                    std::mem::take(&mut tokens),
                    std::mem::take(&mut tags),
                ));
            }
            continue;
        }

        let columns: Vec<&str> = line.split_whitespace().collect();
        let (word, label) = match columns.as_slice() {
            [word, .., label] => (*word, *label),
            _ => {
                return Err(TrainerError::MalformedLine {
                    line: line_number,
                    content: line.to_string(),
                });
            }
        };
        let tag = label
            .parse::<ConllTag>()
            .map_err(|label| TrainerError::UnknownLabel {
                label,
                line: line_number,
            })?;

        tokens.push(word.to_string());
        tags.push(tag);
    }

    if !tokens.is_empty() {
        sentences.push(LabeledSentence::new(tokens, tags));
    }

    Ok(sentences)
}

/// Turns text into token ids for language-model training.
pub trait TokenEncoder {
    /// Token ids of `text` without special tokens.
    fn encode(&self, text: &str) -> clinlp_core::Result<Vec<u32>>;

    /// Id of the sequence start marker.
    fn bos_id(&self) -> u32;

    /// Id of the sequence end marker.
    fn eos_id(&self) -> u32;
}

/// [`TokenEncoder`] backed by a Hugging Face `tokenizer.json`.
pub struct HfTokenEncoder {
    tokenizer: Tokenizer,
    bos_id: u32,
    eos_id: u32,
}

impl HfTokenEncoder {
    /// Load a tokenizer that defines the `<s>` and `</s>` markers.
    pub fn from_file(path: impl AsRef<Path>) -> clinlp_core::Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| ClinlpError::Tokenizer(e.to_string()))?;
        Self::from_tokenizer(tokenizer)
    }

    pub fn from_tokenizer(tokenizer: Tokenizer) -> clinlp_core::Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| ClinlpError::Tokenizer(format!("tokenizer has no {token} token")))
        };
        let bos_id = id("<s>")?;
        let eos_id = id("</s>")?;
        Ok(Self {
            tokenizer,
            bos_id,
            eos_id,
        })
    }
}

impl TokenEncoder for HfTokenEncoder {
    fn encode(&self, text: &str) -> clinlp_core::Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ClinlpError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn bos_id(&self) -> u32 {
        self.bos_id
    }

    fn eos_id(&self) -> u32 {
        self.eos_id
    }
}

/// Language-model examples read one line at a time.
pub struct LineDataset<E> {
    encoder: E,
    examples: Vec<String>,
    block_size: usize,
}

impl<E: TokenEncoder> LineDataset<E> {
    /// Read every non-blank line of `paths`.
    pub fn from_files<P: AsRef<Path>>(encoder: E, paths: &[P], block_size: usize) -> Result<Self> {
        let mut examples = Vec::new();
        for path in paths {
            let path = path.as_ref();
            tracing::info!("Processing file: {}", path.display());
            examples.extend(read_lines(path)?);
        }
        Ok(Self::from_lines(encoder, examples, block_size))
    }

    pub fn from_lines(encoder: E, lines: Vec<String>, block_size: usize) -> Self {
        let examples = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
        Self {
            encoder,
            examples,
            block_size,
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The raw text of example `index`.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.examples.get(index).map(String::as_str)
    }

    /// Encode example `index` as `<s> ids... </s>`, at most `block_size` ids.
    pub fn get(&self, index: usize) -> Result<Vec<u32>> {
        let line = self
            .examples
            .get(index)
            .ok_or(TrainerError::IndexOutOfRange {
                index,
                len: self.examples.len(),
            })?;

        let mut ids = self.encoder.encode(line)?;
        ids.truncate(self.block_size.saturating_sub(2));

        let mut example = Vec::with_capacity(ids.len() + 2);
        example.push(self.encoder.bos_id());
        example.extend(ids);
        example.push(self.encoder.eos_id());
        Ok(example)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    let mut line = String::new();
    while reader.read_line(&mut line)? > 0 {
        if !line.trim().is_empty() {
            lines.push(line.trim_end_matches('\n').to_string());
        }
        line.clear();
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    /// One id per whitespace-separated word: its length.
    struct WordLengths;

    impl TokenEncoder for WordLengths {
        fn encode(&self, text: &str) -> clinlp_core::Result<Vec<u32>> {
            Ok(text.split_whitespace().map(|w| w.len() as u32).collect())
        }

        fn bos_id(&self) -> u32 {
            0
        }

        fn eos_id(&self) -> u32 {
            2
        }
    }

    #[test]
    fn test_parse_conll() {
        let data = "-DOCSTART- -DOCSTART- O\n\nDe Art O\nJan N B-PER\nJansen N I-PER\n\nUtrecht N B-LOC\n";
        let sentences = parse_conll(data.as_bytes()).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens, vec!["De", "Jan", "Jansen"]);
        assert_eq!(
            sentences[0].tags,
            vec![ConllTag::Outside, ConllTag::BeginPer, ConllTag::InsidePer]
        );
        assert_eq!(sentences[1].tags, vec![ConllTag::BeginLoc]);
    }

    #[test]
    fn test_unknown_label() {
        let data = "Jan B-PER\nmaart B-DATE\n";
        let err = parse_conll(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TrainerError::UnknownLabel { ref label, line: 2 } if label == "B-DATE"
        ));
    }

    #[test]
    fn test_malformed_line() {
        let err = parse_conll("Jan\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainerError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_line_dataset_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "eerste regel\n\n   \ntweede regel\n").unwrap();

        let dataset = LineDataset::from_files(WordLengths, &[&path], 512).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.line(1), Some("tweede regel"));
        assert_eq!(dataset.get(0).unwrap(), vec![0, 6, 5, 2]);
    }

    #[test]
    fn test_line_dataset_truncates_before_markers() {
        let lines = vec!["a bb ccc dddd eeeee".to_string()];
        let dataset = LineDataset::from_lines(WordLengths, lines, 4);
        assert_eq!(dataset.get(0).unwrap(), vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_line_dataset_index_out_of_range() {
        let dataset = LineDataset::from_lines(WordLengths, vec!["x".into()], 512);
        assert!(matches!(
            dataset.get(1),
            Err(TrainerError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_hf_encoder() {
        let json = r#"{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {"<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3, "pijn": 4, "op": 5, "borst": 6},
                "unk_token": "<unk>"
            }
        }"#;
        let tokenizer = Tokenizer::from_str(json).unwrap();
        let encoder = HfTokenEncoder::from_tokenizer(tokenizer).unwrap();

        let dataset = LineDataset::from_lines(encoder, vec!["pijn op de borst".into()], 512);
        assert_eq!(dataset.get(0).unwrap(), vec![0, 4, 5, 3, 6, 2]);
    }
}
