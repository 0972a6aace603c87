//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// Nothing in the pipeline recovers from an error locally; every variant
/// reaches the caller of `predict_sentiment` / `run` unchanged.
///
/// # Example
///
/// ```rust,no_run
/// use sentilyze::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::ModelLoad(_) => {
///             // Missing or corrupt artifact - fatal at startup
///         }
///         PipelineError::ShapeMismatch { expected, actual } => {
///             eprintln!("embedding is {actual} wide, classifier wants {expected}");
///         }
///         _ => eprintln!("{e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Hub download failure.
    #[error("{0}")]
    Download(String),

    /// Artifact missing, unreadable or malformed. Fatal at startup.
    #[error("{0}")]
    ModelLoad(String),

    /// Word splitting failed.
    #[error("{0}")]
    Tokenization(String),

    /// Embedding width does not match the classifier input width.
    #[error("shape mismatch: classifier expects input width {expected}, got {actual}")]
    ShapeMismatch {
        /// Width the classifier was built for.
        expected: usize,
        /// Width that was passed in.
        actual: usize,
    },

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::ModelLoad(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::ModelLoad(value.to_string())
    }
}
