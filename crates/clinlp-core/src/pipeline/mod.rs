//! # Language Pipeline Seams
//!
//! The linguistic passes the corpus tools depend on: entity recognition and
//! sentence segmentation. Components receive these as caller-owned values so
//! a rule-based engine, a neural model or a test double can be swapped in.

pub mod neural;
pub mod rules;
pub mod segmenter;

pub use neural::NeuralRecognizer;
pub use rules::{RuleRecognizer, RuleRecognizerConfig};
pub use segmenter::RuleSegmenter;

use crate::entity::EntitySpan;
use crate::error::Result;

/// Anything that can detect entity spans in a text.
pub trait EntityRecognizer {
    /// Detect non-overlapping entity spans in `text`, ordered by start offset.
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Anything that can split a text into sentences.
pub trait SentenceSegmenter {
    /// Split `text` into trimmed, non-empty sentences in document order.
    fn sentences(&self, text: &str) -> Result<Vec<String>>;
}

impl<T: EntityRecognizer + ?Sized> EntityRecognizer for &T {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        (**self).recognize(text)
    }
}

impl<T: EntityRecognizer + ?Sized> EntityRecognizer for Box<T> {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        (**self).recognize(text)
    }
}

impl<T: SentenceSegmenter + ?Sized> SentenceSegmenter for &T {
    fn sentences(&self, text: &str) -> Result<Vec<String>> {
        (**self).sentences(text)
    }
}

impl<T: SentenceSegmenter + ?Sized> SentenceSegmenter for Box<T> {
    fn sentences(&self, text: &str) -> Result<Vec<String>> {
        (**self).sentences(text)
    }
}

/// Sort spans by start offset and drop any that overlap an earlier, longer one.
///
/// Candidates starting at the same offset prefer the longest match.
pub fn resolve_overlaps(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.is_empty() {
            continue;
        }
        match kept.last() {
            Some(last) if last.overlaps(&span) => {}
            _ => kept.push(span),
        }
    }
    kept
}
