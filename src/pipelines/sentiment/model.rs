use crate::error::Result;
use candle_core::{Device, Tensor};

/// Maps a cleaned token sequence to a fixed-length document vector.
///
/// Implementations are shared read-only across pipelines and threads.
pub trait EmbeddingModel: Send + Sync {
    /// Infer a vector for an unseen document. `tokens` may be empty.
    fn infer_vector(&self, tokens: &[&str]) -> Result<Vec<f32>>;

    /// Length of every vector returned by [`infer_vector`](Self::infer_vector).
    fn vector_size(&self) -> usize;
}

/// Maps a `(1, width)` embedding row to a `(1, 3)` class distribution.
///
/// Columns are ordered Positive, Neutral, Negative.
pub trait SentimentClassifier: Send + Sync {
    /// Forward pass. Fails with
    /// [`PipelineError::ShapeMismatch`](crate::error::PipelineError::ShapeMismatch)
    /// when the row width differs from [`input_size`](Self::input_size).
    fn forward(&self, embedding: &Tensor) -> Result<Tensor>;

    /// Embedding width the classifier was trained on.
    fn input_size(&self) -> usize;

    /// Device the classifier runs on.
    fn device(&self) -> &Device;
}
