//! Review sentiment pipeline.
//!
//! Classify a review as `Positive`, `Neutral` or `Negative`:
//! the text is cleaned into lemmas, embedded with a Doc2Vec model and
//! classified by a bidirectional LSTM. The label is the most probable class.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentilyze::sentiment::SentimentAnalysisPipelineBuilder;
//!
//! # fn main() -> sentilyze::error::Result<()> {
//! let pipeline =
//!     SentimentAnalysisPipelineBuilder::from_dirs("models/doc2vec", "models/bilstm").build()?;
//!
//! let output = pipeline.run("The battery died after two days")?;
//! println!("sentiment: {} ({:.2})", output.prediction.label, output.prediction.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Batch Inference
//!
//! ```rust,no_run
//! # use sentilyze::sentiment::SentimentAnalysisPipelineBuilder;
//! # fn main() -> sentilyze::error::Result<()> {
//! # let pipeline = SentimentAnalysisPipelineBuilder::from_dirs("models/doc2vec", "models/bilstm").build()?;
//! let reviews = &[
//!     "Best purchase I've ever made!",
//!     "Terrible quality, very disappointed.",
//!     "It's okay, nothing special.",
//! ];
//!
//! let output = pipeline.run(reviews)?;
//! for r in output.results {
//!     let p = r.prediction?;
//!     println!("{}: {} ({:.2})", r.text, p.label, p.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Custom models
//!
//! Any [`EmbeddingModel`] and [`SentimentClassifier`] pair can be wired in
//! with [`SentimentAnalysisPipeline::new`].
//!
//! # Label order
//!
//! Classifier columns are read as Positive, Neutral, Negative. A classifier
//! config that declares a different order only triggers a warning at load
//! time; predictions keep the fixed order.

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::loaders::ArtifactSource;
pub use crate::models::{
    BiLstmClassifier, BiLstmConfig, Doc2VecConfig, Doc2VecMode, Doc2VecModel, VocabEntry,
};
pub use crate::pipelines::stats::PipelineStats;
pub use builder::SentimentAnalysisPipelineBuilder;
pub use model::{EmbeddingModel, SentimentClassifier};
pub use pipeline::{
    BatchOutput, BatchResult, Output, Prediction, Sentiment, SentimentAnalysisPipeline,
};

#[doc(hidden)]
pub use pipeline::SentimentInput;
