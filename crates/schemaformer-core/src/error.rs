//! Error types for schema-guided generation.

use thiserror::Error;

/// Errors surfaced by the generation engine.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The schema violates the supported subset: an array without `items`,
    /// an object without `properties`, or a non-object root. Fatal and
    /// non-retryable.
    #[error("malformed schema at {path}: {message}")]
    MalformedSchema { path: String, message: String },

    /// The schema declares a `type` outside the supported set. Only
    /// reachable at the JSON boundary: the [`Schema`](crate::Schema) enum
    /// itself is closed and matched exhaustively.
    #[error("unsupported schema type at {path}: {type_name}")]
    UnsupportedSchemaType { path: String, type_name: String },

    /// The serialized partial document did not contain exactly one
    /// generation marker. Signals an engine bug, not bad input.
    #[error("expected exactly one generation marker in serialized progress, found {found}")]
    MarkerNotFound { found: usize },

    /// The model did not produce a parseable number within the retry
    /// budget, even with escalating temperature.
    #[error("failed to generate a valid number after {attempts} attempts (last output: {last_output:?})")]
    NumberGenerationFailed { attempts: usize, last_output: String },

    /// A collaborator failure, propagated unmodified.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Errors raised by the tokenizer/model collaborators.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("model error: {0}")]
    Model(String),

    /// Any other backend failure, carried as a boxed error.
    #[error("inference backend error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
