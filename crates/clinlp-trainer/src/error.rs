use clinlp_core::ClinlpError;
use thiserror::Error;

/// Errors raised by the training and evaluation tools.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// A tag outside the CoNLL label set was found in a data file.
    #[error("unknown label {label:?} on line {line}")]
    UnknownLabel { label: String, line: usize },

    /// A data line has no tag column.
    #[error("malformed line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    /// The requested sequence labeler does not exist.
    #[error("unsupported model type {0:?}, expected \"perceptron\" or \"crf\"")]
    UnsupportedModelType(String),

    /// A dataset index past the end.
    #[error("index {index} out of range for dataset of {len} examples")]
    IndexOutOfRange { index: usize, len: usize },

    /// Mask prediction was asked to run over no sentences.
    #[error("no sentences to predict")]
    NoSentences,

    /// A saved model does not match the label set.
    #[error("invalid model file: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    Core(#[from] ClinlpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for the trainer crate.
pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TrainerError::UnknownLabel {
            label: "B-DATE".into(),
            line: 7,
        };
        assert_eq!(err.to_string(), "unknown label \"B-DATE\" on line 7");

        let err = TrainerError::IndexOutOfRange { index: 3, len: 2 };
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn core_errors_are_transparent() {
        let err: TrainerError = ClinlpError::EmptyInput.into();
        assert_eq!(err.to_string(), "input is empty or whitespace-only");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrainerError>();
    }
}
