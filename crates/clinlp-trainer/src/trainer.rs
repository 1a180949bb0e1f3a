//! Training loop for sequence labelers.

use oorandom::Rand32;

use crate::data::LabeledSentence;
use crate::model::SequenceLabeler;

pub const DEFAULT_EPOCHS: usize = 5;
pub const DEFAULT_SEED: u64 = 13;

/// Per-epoch training accuracy, as measured before each update.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epoch_accuracy: Vec<f32>,
}

impl TrainingSummary {
    pub fn final_accuracy(&self) -> Option<f32> {
        self.epoch_accuracy.last().copied()
    }
}

pub struct Trainer {
    epochs: usize,
    seed: u64,
}

impl Trainer {
    pub fn new(epochs: usize, seed: u64) -> Self {
        Self { epochs, seed }
    }

    /// Run `epochs` passes over `examples` in a shuffled order.
    pub fn train<L: SequenceLabeler + ?Sized>(
        &self,
        model: &mut L,
        examples: &[LabeledSentence],
    ) -> TrainingSummary {
        tracing::info!("Loaded {} training examples", examples.len());
        let mut rng = Rand32::new(self.seed);
        let mut epoch_accuracy = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let mut errors = 0usize;
            let mut total = 0usize;

            // Shuffle
            let mut indices: Vec<usize> = (0..examples.len()).collect();
            for i in (1..indices.len()).rev() {
                let j = rng.rand_range(0..(i as u32 + 1)) as usize;
                indices.swap(i, j);
            }

            for (step, &idx) in indices.iter().enumerate() {
                let example = &examples[idx];
                errors += model.train_step(example);
                total += example.len();

                if (step + 1) % 5000 == 0 {
                    tracing::debug!(
                        "Epoch {}/{}, Step {}/{}, Accuracy: {:.2}%",
                        epoch + 1,
                        self.epochs,
                        step + 1,
                        examples.len(),
                        accuracy(errors, total) * 100.0
                    );
                }
            }

            let acc = accuracy(errors, total);
            tracing::info!(
                "Epoch {}/{} complete - Accuracy: {:.2}%",
                epoch + 1,
                self.epochs,
                acc * 100.0
            );
            epoch_accuracy.push(acc);
        }

        TrainingSummary { epoch_accuracy }
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(DEFAULT_EPOCHS, DEFAULT_SEED)
    }
}

fn accuracy(errors: usize, total: usize) -> f32 {
    if total > 0 {
        1.0 - errors as f32 / total as f32
    } else {
        0.0
    }
}
