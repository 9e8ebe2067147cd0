use thiserror::Error;

/// Errors that can occur while producing embeddings.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The input string is empty, whitespace-only, or has no indexable tokens.
    #[error("input is empty or contains no indexable tokens")]
    EmptyInput,

    /// A required model file is missing or the weights could not be loaded.
    #[error("failed to load embedding model: {0}")]
    ModelLoad(String),

    /// The tokenizer could not be loaded or failed to encode the input.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The model forward pass or tensor post-processing failed.
    #[error("inference error: {0}")]
    Inference(String),
}

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;
