//! Review sentiment analysis in Rust.
//!
//! A short review is cleaned into lemmas, embedded with a pretrained
//! paragraph-vector (Doc2Vec) model and classified by a pretrained
//! bidirectional LSTM into `Positive`, `Neutral` or `Negative`.
//! Tensors run on [Candle](https://github.com/huggingface/candle).

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod error;
pub mod normalizer;

pub use normalizer::clean_text;
pub use pipelines::sentiment;
