//! # Rule-based Sentence Segmenter
//!
//! Splits clinical free text into sentences on terminal punctuation,
//! skipping common Dutch abbreviations, initials and enumerations.

use std::collections::HashSet;

use crate::error::Result;
use crate::pipeline::SentenceSegmenter;

/// Abbreviations (lowercase, without the final period) that never end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dr", "drs", "dhr", "mw", "mevr", "mr", "prof", "ir", "ing", "st", "nr", "ca", "bijv",
    "resp", "evt", "vnl", "ong", "incl", "excl", "tel", "pt", "pat", "jl", "vlg", "zgn", "zg",
    "etc", "vs", "jr", "sr", "e.a", "o.a", "i.v.m", "m.b.t", "t.a.v", "d.d", "z.n", "i.o.m",
    "a.s", "c.q", "d.w.z", "m.n", "n.a.v", "i.c.m",
];

/// Characters that may trail a terminal punctuation mark inside the same sentence.
fn is_closer(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Whether a character can open a new sentence.
fn opens_sentence(c: char) -> bool {
    c.is_uppercase()
        || c.is_ascii_digit()
        || matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘' | '«' | '-' | '•' | '*')
}

/// Sentence segmenter driven by punctuation and an abbreviation list.
#[derive(Debug, Clone)]
pub struct RuleSegmenter {
    abbreviations: HashSet<String>,
}

impl Default for RuleSegmenter {
    fn default() -> Self {
        Self {
            abbreviations: ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl RuleSegmenter {
    /// Create a segmenter with the built-in abbreviation list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add abbreviations (case-insensitive, without the trailing period).
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    /// Whether the word right before a period is an abbreviation or initial.
    fn is_abbreviation(&self, preceding: &str) -> bool {
        let word = preceding
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
            .trim_start_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            return false;
        }

        let lower = word.to_lowercase();
        if self.abbreviations.contains(&lower) {
            return true;
        }

        // Single-letter initials: "J. de Vries"
        let mut chars = word.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            return first.is_alphabetic();
        }

        // Dotted short forms: "i.v.m", "a.u.b"
        lower.contains('.')
            && lower
                .split('.')
                .all(|part| part.chars().count() <= 2 && part.chars().all(char::is_alphabetic))
    }
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

impl SentenceSegmenter for RuleSegmenter {
    fn sentences(&self, text: &str) -> Result<Vec<String>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (idx, c) = chars[i];

            if c == '\n' {
                // A blank line always separates sentences
                let mut k = i;
                let mut newlines = 0;
                while k < chars.len() && chars[k].1.is_whitespace() {
                    if chars[k].1 == '\n' {
                        newlines += 1;
                    }
                    k += 1;
                }
                if newlines >= 2 {
                    push_sentence(&mut sentences, &text[start..idx]);
                    start = idx;
                }
                i = k;
                continue;
            }

            if !is_terminal(c) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && is_closer(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map_or(text.len(), |&(pos, _)| pos);

            let at_break = j == chars.len() || chars[j].1.is_whitespace();
            if at_break {
                let mut k = j;
                while k < chars.len() && chars[k].1.is_whitespace() {
                    k += 1;
                }
                let next_opens = k == chars.len() || opens_sentence(chars[k].1);
                let abbreviated = c == '.' && self.is_abbreviation(&text[start..idx]);

                if next_opens && !abbreviated {
                    push_sentence(&mut sentences, &text[start..end]);
                    start = end;
                }
            }
            i = j;
        }

        push_sentence(&mut sentences, &text[start..]);
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        RuleSegmenter::new().sentences(text).unwrap()
    }

    #[test]
    fn test_basic_split() {
        assert_eq!(
            split("Sentence one. Sentence two. Sentence three."),
            vec!["Sentence one.", "Sentence two.", "Sentence three."]
        );
    }

    #[test]
    fn test_honorific_is_not_a_boundary() {
        assert_eq!(
            split("Dr. PERSON visited GPE on DATE."),
            vec!["Dr. PERSON visited GPE on DATE."]
        );
    }

    #[test]
    fn test_dotted_abbreviation_and_initial() {
        assert_eq!(
            split("Opgenomen i.v.m. koorts. Gezien door J. de Vries. Geen klachten!"),
            vec![
                "Opgenomen i.v.m. koorts.",
                "Gezien door J. de Vries.",
                "Geen klachten!"
            ]
        );
    }

    #[test]
    fn test_lowercase_continuation_is_not_a_boundary() {
        assert_eq!(
            split("Bloeddruk 120/80 mmHg. en pols regulair."),
            vec!["Bloeddruk 120/80 mmHg. en pols regulair."]
        );
    }

    #[test]
    fn test_blank_line_and_missing_period() {
        assert_eq!(
            split("Anamnese\n\nPatiënt meldt pijn. Geen koorts"),
            vec!["Anamnese", "Patiënt meldt pijn.", "Geen koorts"]
        );
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        assert_eq!(
            split("Zij zei: \"Het gaat beter.\" Daarna sliep ze."),
            vec!["Zij zei: \"Het gaat beter.\"", "Daarna sliep ze."]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(split("").is_empty());
        assert!(split("  \n\n ").is_empty());
    }

    #[test]
    fn test_custom_abbreviation() {
        let segmenter = RuleSegmenter::new().with_abbreviations(["cf."]);
        let sentences = segmenter.sentences("Zie cf. Bijlage twee. Einde.").unwrap();
        assert_eq!(sentences, vec!["Zie cf. Bijlage twee.", "Einde."]);
    }
}
