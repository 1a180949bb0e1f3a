pub mod distilbert;

pub use distilbert::{HeadConfig, MaskedLm, TokenClassifier, full_attention_mask, read_configs};
