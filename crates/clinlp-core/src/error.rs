use thiserror::Error;

/// Errors that can occur during clinlp core operations.
#[derive(Debug, Error)]
pub enum ClinlpError {
    /// The input text is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// An entity span does not fit the text it was detected in.
    #[error("invalid entity span {start}..{end} for text of {len} bytes")]
    InvalidSpan {
        /// Start byte offset of the span.
        start: usize,
        /// End byte offset of the span.
        end: usize,
        /// Length of the text in bytes.
        len: usize,
    },

    /// The requested text column is not present in the table header.
    #[error("column {column:?} not found in table header")]
    MissingColumn {
        /// The column that was requested.
        column: String,
    },

    /// Statistics were requested for a run that wrote no chunks.
    #[error("no chunks were produced, statistics are undefined")]
    NoChunksProduced,

    /// The sampler's filtered pool was empty.
    #[error("no sentences passed the sampling filters")]
    NoSentencesRetained,

    /// A sentence handed to the mask filler does not hold exactly one mask.
    #[error("expected exactly one mask token in sentence, found {found}: {sentence:?}")]
    MaskCount {
        /// The offending sentence.
        sentence: String,
        /// Number of mask tokens found.
        found: usize,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing a delimited table failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A regex pattern failed to compile.
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// The model files could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// The tokenizer failed to load, encode or decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Candle ML framework error.
    #[error("ML inference error: {0}")]
    CandleError(String),
}

impl From<candle_core::Error> for ClinlpError {
    fn from(err: candle_core::Error) -> Self {
        ClinlpError::CandleError(err.to_string())
    }
}

/// Result type alias for clinlp operations.
pub type Result<T> = std::result::Result<T, ClinlpError>;
