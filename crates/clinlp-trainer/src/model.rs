//! Structured perceptron for CoNLL sequence labeling.
//! Sparse string features per token, learned transitions, and Viterbi
//! decoding restricted to well-formed IOB2 paths.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::LabeledSentence;
use crate::error::{Result, TrainerError};
use crate::tags::ConllTag;

pub const NUM_LABELS: usize = ConllTag::NUM_TAGS;

/// A model that assigns one CoNLL tag per token.
pub trait SequenceLabeler {
    /// Run one pass of training over `sentence`; returns the number of
    /// tokens that were mislabeled before the update.
    fn train_step(&mut self, sentence: &LabeledSentence) -> usize;

    /// Tag every token of `tokens`.
    fn predict(&self, tokens: &[String]) -> Vec<ConllTag>;

    /// Persist the model to `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptronTagger {
    num_labels: usize,
    /// Per-label weight of every feature seen in training.
    weights: HashMap<String, Vec<f32>>,
    /// Indexed `to * NUM_LABELS + from`.
    transition: Vec<f32>,
    /// Score of each label opening a sentence.
    start: Vec<f32>,
}

impl PerceptronTagger {
    pub fn new() -> Self {
        Self {
            num_labels: NUM_LABELS,
            weights: HashMap::new(),
            transition: vec![0.0; NUM_LABELS * NUM_LABELS],
            start: vec![0.0; NUM_LABELS],
        }
    }

    /// Number of distinct features with weights.
    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        if model.num_labels != NUM_LABELS
            || model.transition.len() != NUM_LABELS * NUM_LABELS
            || model.start.len() != NUM_LABELS
            || model.weights.values().any(|w| w.len() != NUM_LABELS)
        {
            return Err(TrainerError::InvalidModel(format!(
                "{} does not match the {NUM_LABELS}-label set",
                path.display()
            )));
        }
        Ok(model)
    }

    fn extract_features(tokens: &[String], i: usize) -> Vec<String> {
        let token = tokens[i].as_str();
        let lower = token.to_lowercase();
        let chars: Vec<char> = lower.chars().collect();
        let prefix: String = chars.iter().take(3).collect();
        let suffix: String = chars[chars.len().saturating_sub(3)..].iter().collect();

        let mut features = vec![
            "bias".to_string(),
            format!("w={lower}"),
            format!("pre3={prefix}"),
            format!("suf3={suffix}"),
            format!("shape={}", word_shape(token)),
        ];

        if token.chars().next().is_some_and(char::is_uppercase) {
            features.push("title".into());
        }
        if token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase) {
            features.push("upper".into());
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            features.push("digit".into());
        }
        if token.contains('-') {
            features.push("hyphen".into());
        }
        if i == 0 {
            features.push("first".into());
        }

        // Context features
        match i.checked_sub(1).and_then(|p| tokens.get(p)) {
            Some(prev) => features.push(format!("prev={}", prev.to_lowercase())),
            None => features.push("prev=<s>".into()),
        }
        match tokens.get(i + 1) {
            Some(next) => features.push(format!("next={}", next.to_lowercase())),
            None => features.push("next=</s>".into()),
        }

        features
    }

    fn emissions(&self, features: &[Vec<String>]) -> Vec<Vec<f32>> {
        features
            .iter()
            .map(|token_features| {
                let mut scores = vec![0.0f32; NUM_LABELS];
                for feature in token_features {
                    if let Some(weights) = self.weights.get(feature) {
                        for (score, w) in scores.iter_mut().zip(weights) {
                            *score += w;
                        }
                    }
                }
                scores
            })
            .collect()
    }

    /// Transition and start scores with ill-formed IOB2 moves forbidden.
    fn constrained_scores(&self) -> (Vec<f32>, Vec<f32>) {
        let mut transition = self.transition.clone();
        let mut start = self.start.clone();
        for &from in ConllTag::all_tags() {
            for &to in ConllTag::all_tags() {
                if !ConllTag::is_valid_transition(from, to) {
                    transition[to.index() * NUM_LABELS + from.index()] = f32::NEG_INFINITY;
                }
            }
        }
        for &tag in ConllTag::all_tags() {
            if !tag.is_valid_start() {
                start[tag.index()] = f32::NEG_INFINITY;
            }
        }
        (transition, start)
    }

    fn decode(&self, features: &[Vec<String>]) -> Vec<usize> {
        let emissions = self.emissions(features);
        let (transition, start) = self.constrained_scores();
        viterbi_decode(&emissions, &transition, &start)
    }

    fn update(&mut self, features: &[Vec<String>], gold: &[usize], pred: &[usize]) {
        for (i, token_features) in features.iter().enumerate() {
            if gold[i] == pred[i] {
                continue;
            }
            for feature in token_features {
                let weights = self
                    .weights
                    .entry(feature.clone())
                    .or_insert_with(|| vec![0.0; NUM_LABELS]);
                weights[gold[i]] += 1.0;
                weights[pred[i]] -= 1.0;
            }
        }

        if let (Some(&g), Some(&p)) = (gold.first(), pred.first()) {
            self.start[g] += 1.0;
            self.start[p] -= 1.0;
        }
        for i in 1..gold.len() {
            self.transition[gold[i] * NUM_LABELS + gold[i - 1]] += 1.0;
            self.transition[pred[i] * NUM_LABELS + pred[i - 1]] -= 1.0;
        }
    }
}

impl Default for PerceptronTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceLabeler for PerceptronTagger {
    fn train_step(&mut self, sentence: &LabeledSentence) -> usize {
        if sentence.is_empty() {
            return 0;
        }
        let features: Vec<Vec<String>> = (0..sentence.len())
            .map(|i| Self::extract_features(&sentence.tokens, i))
            .collect();
        let gold: Vec<usize> = sentence.tags.iter().map(ConllTag::index).collect();
        let pred = self.decode(&features);

        let errors = gold.iter().zip(&pred).filter(|(g, p)| g != p).count();
        if errors > 0 {
            self.update(&features, &gold, &pred);
        }
        errors
    }

    fn predict(&self, tokens: &[String]) -> Vec<ConllTag> {
        let features: Vec<Vec<String>> = (0..tokens.len())
            .map(|i| Self::extract_features(tokens, i))
            .collect();
        self.decode(&features)
            .into_iter()
            .map(|idx| ConllTag::from_index(idx).unwrap_or(ConllTag::Outside))
            .collect()
    }

    fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Model saved to {}", path.display());
        Ok(())
    }
}

/// Collapse a token to its character classes: "Jan-Willem" -> "Xx-Xx".
fn word_shape(token: &str) -> String {
    let mut shape = String::new();
    for c in token.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };
        if !shape.ends_with(class) {
            shape.push(class);
        }
    }
    shape
}

/// Best label path under `transitions[to * n + from]` and `start` scores.
///
/// `emissions` holds one row of `n` label scores per position.
pub fn viterbi_decode(emissions: &[Vec<f32>], transitions: &[f32], start: &[f32]) -> Vec<usize> {
    let seq_len = emissions.len();
    let num_labels = start.len();
    if seq_len == 0 || num_labels == 0 {
        return vec![];
    }

    let mut viterbi = vec![vec![f32::NEG_INFINITY; num_labels]; seq_len];
    let mut backpointers = vec![vec![0usize; num_labels]; seq_len];

    // Initialize
    for j in 0..num_labels {
        viterbi[0][j] = start[j] + emissions[0][j];
    }

    // Forward pass
    for t in 1..seq_len {
        for j in 0..num_labels {
            let mut best_score = f32::NEG_INFINITY;
            let mut best_prev = 0;

            for i in 0..num_labels {
                let score = viterbi[t - 1][i] + transitions[j * num_labels + i];
                if score > best_score {
                    best_score = score;
                    best_prev = i;
                }
            }

            viterbi[t][j] = best_score + emissions[t][j];
            backpointers[t][j] = best_prev;
        }
    }

    // Backtrack
    let mut path = vec![0usize; seq_len];
    path[seq_len - 1] = viterbi[seq_len - 1]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    for t in (0..seq_len - 1).rev() {
        path[t] = backpointers[t + 1][path[t + 1]];
    }

    path
}
