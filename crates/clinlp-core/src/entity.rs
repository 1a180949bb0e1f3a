//! # Entity Spans
//!
//! Categories and byte-offset spans reported by an entity recognizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClinlpError, Result};

/// Entity categories reported by a recognizer.
///
/// Only `Person`, `Gpe` and `Date` are redacted by default; anything else a
/// recognizer emits is kept as `Other` so callers can still inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    /// People, including fictional.
    Person,
    /// Geopolitical entities: countries, cities, states.
    Gpe,
    /// Absolute or relative dates and periods.
    Date,
    /// Any other category name.
    Other(String),
}

impl EntityCategory {
    /// The categories redacted by the anonymizer unless configured otherwise.
    pub const REDACTED: [EntityCategory; 3] =
        [EntityCategory::Person, EntityCategory::Gpe, EntityCategory::Date];

    /// The label written into anonymized text.
    pub fn label(&self) -> &str {
        match self {
            EntityCategory::Person => "PERSON",
            EntityCategory::Gpe => "GPE",
            EntityCategory::Date => "DATE",
            EntityCategory::Other(name) => name,
        }
    }

    /// Map a model label (with or without a `B-`/`I-` prefix) to a category.
    pub fn from_model_label(label: &str) -> Self {
        let bare = label
            .strip_prefix("B-")
            .or_else(|| label.strip_prefix("I-"))
            .unwrap_or(label);
        match bare.to_ascii_uppercase().as_str() {
            "PER" | "PERSON" => EntityCategory::Person,
            "LOC" | "GPE" => EntityCategory::Gpe,
            "DATE" => EntityCategory::Date,
            _ => EntityCategory::Other(bare.to_string()),
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_model_label(s))
    }
}

/// A labelled substring of a text, addressed by UTF-8 byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Category of the entity.
    pub category: EntityCategory,
}

impl EntitySpan {
    /// Create a new span.
    pub fn new(start: usize, end: usize, category: EntityCategory) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the two spans share at least one byte.
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check that the span addresses a valid slice of `text`.
    pub fn validate(&self, text: &str) -> Result<()> {
        let valid = self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end);
        if valid {
            Ok(())
        } else {
            Err(ClinlpError::InvalidSpan {
                start: self.start,
                end: self.end,
                len: text.len(),
            })
        }
    }

    /// The covered text. Call [`EntitySpan::validate`] first.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}
