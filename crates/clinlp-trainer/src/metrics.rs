//! # Entity-level Evaluation
//!
//! Precision, recall and F1 over IOB2 chunks, computed per entity type and
//! micro-averaged, plus token accuracy. Chunking is lenient: an inside tag
//! that does not continue a chunk of its own type opens a new one.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::tags::{ConllTag, EntityType};

/// A chunk of consecutive tokens `start..end` in one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagChunk {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
}

/// Extract entity chunks from an IOB2 tag sequence.
pub fn extract_chunks(tags: &[ConllTag]) -> Vec<TagChunk> {
    let mut chunks = Vec::new();
    let mut open: Option<(EntityType, usize)> = None;

    for (i, tag) in tags.iter().enumerate() {
        let entity_type = tag.entity_type();
        let continues = match (open, entity_type) {
            (Some((open_type, _)), Some(t)) => tag.is_inside() && open_type == t,
            _ => false,
        };
        if continues {
            continue;
        }
        if let Some((t, start)) = open.take() {
            chunks.push(TagChunk {
                entity_type: t,
                start,
                end: i,
            });
        }
        if let Some(t) = entity_type {
            open = Some((t, i));
        }
    }

    if let Some((t, start)) = open {
        chunks.push(TagChunk {
            entity_type: t,
            start,
            end: tags.len(),
        });
    }
    chunks
}

/// Scores for one entity type or an average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypeScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Gold chunks of this type.
    pub support: usize,
}

impl TypeScores {
    fn from_counts(correct: usize, predicted: usize, gold: usize) -> Self {
        let precision = ratio(correct, predicted);
        let recall = ratio(correct, gold);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: gold,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Result of evaluating predictions against gold tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub per_type: BTreeMap<EntityType, TypeScores>,
    pub micro: TypeScores,
    pub accuracy: f64,
    pub tokens: usize,
}

impl EvalReport {
    /// Compare predicted tag sequences with gold ones, sentence by sentence.
    ///
    /// Sentences are paired by position; tokens beyond the shorter of a pair
    /// count as errors.
    pub fn evaluate(gold: &[Vec<ConllTag>], predicted: &[Vec<ConllTag>]) -> Self {
        let mut gold_chunks = HashSet::new();
        let mut pred_chunks = HashSet::new();
        let mut correct_tokens = 0;
        let mut tokens = 0;

        for (sentence, (g, p)) in gold.iter().zip(predicted).enumerate() {
            gold_chunks.extend(extract_chunks(g).into_iter().map(|c| (sentence, c)));
            pred_chunks.extend(extract_chunks(p).into_iter().map(|c| (sentence, c)));
            correct_tokens += g.iter().zip(p).filter(|(a, b)| a == b).count();
            tokens += g.len();
        }

        let mut types: Vec<EntityType> = gold_chunks
            .iter()
            .chain(&pred_chunks)
            .map(|(_, c)| c.entity_type)
            .collect();
        types.sort();
        types.dedup();

        let count = |set: &HashSet<(usize, TagChunk)>, t: EntityType| {
            set.iter().filter(|(_, c)| c.entity_type == t).count()
        };
        let per_type = types
            .into_iter()
            .map(|t| {
                let correct = gold_chunks
                    .iter()
                    .filter(|entry| entry.1.entity_type == t && pred_chunks.contains(*entry))
                    .count();
                (
                    t,
                    TypeScores::from_counts(correct, count(&pred_chunks, t), count(&gold_chunks, t)),
                )
            })
            .collect();

        let correct = gold_chunks.intersection(&pred_chunks).count();
        Self {
            per_type,
            micro: TypeScores::from_counts(correct, pred_chunks.len(), gold_chunks.len()),
            accuracy: ratio(correct_tokens, tokens),
            tokens,
        }
    }

    /// Flat result map with the micro scores, keyed like the usual NER tooling.
    pub fn summary(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("precision", self.micro.precision),
            ("recall", self.micro.recall),
            ("f1_score", self.micro.f1),
            ("accuracy", self.accuracy),
        ])
    }
}

/// Renders the classification report.
impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (entity_type, scores) in &self.per_type {
            write_row(f, &entity_type.to_string(), scores)?;
        }
        writeln!(f)?;
        write_row(f, "micro avg", &self.micro)?;
        write!(f, "{:>12} {:>10.2}", "accuracy", self.accuracy)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, s: &TypeScores) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
        name, s.precision, s.recall, s.f1, s.support
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConllTag::*;

    #[test]
    fn test_extract_chunks() {
        let tags = [BeginPer, InsidePer, Outside, BeginLoc, BeginLoc, InsideLoc];
        let chunks = extract_chunks(&tags);
        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 2));
        assert_eq!((chunks[1].start, chunks[1].end), (3, 4));
        assert_eq!((chunks[2].start, chunks[2].end), (4, 6));
    }

    #[test]
    fn test_lenient_inside_opens_chunk() {
        let chunks = extract_chunks(&[Outside, InsideOrg, InsideOrg, InsideMisc]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].entity_type, EntityType::Org);
        assert_eq!((chunks[0].start, chunks[0].end), (1, 3));
        assert_eq!(chunks[1].entity_type, EntityType::Misc);
    }

    #[test]
    fn test_perfect_prediction() {
        let gold = vec![vec![BeginPer, InsidePer, Outside, BeginLoc]];
        let report = EvalReport::evaluate(&gold, &gold);
        assert_eq!(report.micro.f1, 1.0);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.micro.support, 2);
    }

    #[test]
    fn test_partial_prediction() {
        let gold = vec![vec![BeginPer, InsidePer, Outside, BeginLoc]];
        // Boundary error on PER, LOC correct, one spurious ORG
        let pred = vec![vec![BeginPer, Outside, BeginOrg, BeginLoc]];
        let report = EvalReport::evaluate(&gold, &pred);

        assert_eq!(report.micro.precision, 1.0 / 3.0);
        assert_eq!(report.micro.recall, 0.5);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.per_type[&EntityType::Loc].f1, 1.0);
        assert_eq!(report.per_type[&EntityType::Per].f1, 0.0);
        assert_eq!(report.per_type[&EntityType::Org].support, 0);
    }

    #[test]
    fn test_report_rendering() {
        let gold = vec![vec![BeginPer, Outside]];
        let rendered = EvalReport::evaluate(&gold, &gold).to_string();
        assert!(rendered.contains("precision"));
        assert!(rendered.contains("PER"));
        assert!(rendered.contains("micro avg"));
    }

    #[test]
    fn test_empty_evaluation() {
        let report = EvalReport::evaluate(&[], &[]);
        assert_eq!(report.micro, TypeScores::default());
        assert_eq!(report.tokens, 0);
    }
}
