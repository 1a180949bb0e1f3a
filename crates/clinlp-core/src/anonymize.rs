//! # Note Anonymizer
//!
//! Replaces every redactable entity span in a note with its category label.

use crate::entity::{EntityCategory, EntitySpan};
use crate::error::{ClinlpError, Result};
use crate::pipeline::EntityRecognizer;

/// Which entity categories get redacted.
#[derive(Debug, Clone)]
pub struct AnonymizerConfig {
    /// Categories replaced by their label. Anything else is left in place.
    pub categories: Vec<EntityCategory>,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            categories: EntityCategory::REDACTED.to_vec(),
        }
    }
}

impl AnonymizerConfig {
    /// Create a configuration redacting PERSON, GPE and DATE.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the redacted category set.
    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = EntityCategory>,
    {
        self.categories = categories.into_iter().collect();
        self
    }

    fn redacts(&self, category: &EntityCategory) -> bool {
        self.categories.contains(category)
    }
}

/// Redacts sensitive spans found by an [`EntityRecognizer`].
pub struct NoteAnonymizer<R> {
    recognizer: R,
    config: AnonymizerConfig,
}

impl<R: EntityRecognizer> NoteAnonymizer<R> {
    /// Wrap a recognizer with the default redaction set.
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, AnonymizerConfig::default())
    }

    /// Wrap a recognizer with an explicit configuration.
    pub fn with_config(recognizer: R, config: AnonymizerConfig) -> Self {
        Self { recognizer, config }
    }

    /// The wrapped recognizer.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Return `text` with each redactable span replaced by its category label.
    ///
    /// Offsets are taken against the original text and the result is built
    /// by concatenating the untouched segments with the labels, so earlier
    /// replacements never shift later ones.
    ///
    /// # Errors
    ///
    /// Propagates recognizer errors. A span out of range, off a character
    /// boundary or overlapping another is `ClinlpError::InvalidSpan`.
    pub fn anonymize(&self, text: &str) -> Result<String> {
        let mut spans: Vec<EntitySpan> = self
            .recognizer
            .recognize(text)?
            .into_iter()
            .filter(|span| self.config.redacts(&span.category))
            .collect();

        for span in &spans {
            span.validate(text)?;
        }
        spans.sort_by_key(|span| (span.start, span.end));

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in &spans {
            if span.start < cursor {
                return Err(ClinlpError::InvalidSpan {
                    start: span.start,
                    end: span.end,
                    len: text.len(),
                });
            }
            out.push_str(&text[cursor..span.start]);
            out.push_str(span.category.label());
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);

        tracing::trace!("Redacted {} spans", spans.len());
        Ok(out)
    }
}
