use std::fmt;
use std::sync::Arc;

use candle_core::{DType, IndexOp, Tensor};

use super::model::{EmbeddingModel, SentimentClassifier};
use crate::error::{PipelineError, Result};
use crate::normalizer::TextNormalizer;
use crate::pipelines::stats::PipelineStats;

// ============ Labels ============

/// Sentiment class. Index order matches the classifier output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    /// Column 0.
    Positive,
    /// Column 1.
    Neutral,
    /// Column 2.
    Negative,
}

impl Sentiment {
    /// All labels in classifier column order.
    pub const ALL: [Sentiment; 3] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Negative,
    ];

    /// Label for a classifier column, if there is one.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// `"Positive"`, `"Neutral"` or `"Negative"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of the largest value; the lowest index wins exact ties. A NaN counts
/// as the maximum, so the first NaN wins.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return Some(i);
        }
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ============ Output types ============

/// A sentiment prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted label.
    pub label: Sentiment,
    /// Probability of the predicted label.
    pub score: f32,
    /// Full class distribution, Positive, Neutral, Negative.
    pub distribution: Vec<f32>,
}

/// Single-text output from `run()`.
#[derive(Debug)]
pub struct Output {
    /// Sentiment prediction.
    pub prediction: Prediction,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Single result in batch output.
#[derive(Debug)]
pub struct BatchResult {
    /// Input text.
    pub text: String,
    /// Prediction or error for this input.
    pub prediction: Result<Prediction>,
}

/// Batch output from `run()`.
#[derive(Debug)]
pub struct BatchOutput {
    /// Results for each input.
    pub results: Vec<BatchResult>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Input trait for type-based dispatch ============

#[doc(hidden)]
pub trait SentimentInput<'a> {
    /// Output type for `.run()`.
    type Output;

    #[doc(hidden)]
    fn into_texts(self) -> Vec<&'a str>;
    #[doc(hidden)]
    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Prediction>>,
        stats: PipelineStats,
    ) -> Result<Self::Output>;
}

fn batch_output(
    texts: Vec<&str>,
    predictions: Vec<Result<Prediction>>,
    stats: PipelineStats,
) -> BatchOutput {
    let results = texts
        .into_iter()
        .zip(predictions)
        .map(|(text, prediction)| BatchResult {
            text: text.to_string(),
            prediction,
        })
        .collect();
    BatchOutput { results, stats }
}

impl<'a> SentimentInput<'a> for &'a str {
    type Output = Output;

    fn into_texts(self) -> Vec<&'a str> {
        vec![self]
    }

    fn convert_output(
        _texts: Vec<&'a str>,
        mut predictions: Vec<Result<Prediction>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        let prediction = predictions
            .pop()
            .ok_or_else(|| PipelineError::Unexpected("No predictions returned".into()))??;
        Ok(Output { prediction, stats })
    }
}

impl<'a> SentimentInput<'a> for &'a [&'a str] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.to_vec()
    }

    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Prediction>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(batch_output(texts, predictions, stats))
    }
}

impl<'a, const N: usize> SentimentInput<'a> for &'a [&'a str; N] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.as_slice().to_vec()
    }

    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Prediction>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(batch_output(texts, predictions, stats))
    }
}

// ============ Pipeline ============

/// Classifies review sentiment: clean → embed → classify.
///
/// Construct with [`SentimentAnalysisPipelineBuilder`](super::SentimentAnalysisPipelineBuilder),
/// or with [`new`](Self::new) from any embedding model and classifier.
///
/// ```rust,no_run
/// # use sentilyze::sentiment::SentimentAnalysisPipelineBuilder;
/// # fn main() -> sentilyze::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::from_dirs("models/doc2vec", "models/bilstm")
///     .build()?;
///
/// let label = pipeline.predict_sentiment("Fast delivery, works perfectly")?;
/// println!("{label}");
///
/// let output = pipeline.run(&["Great!", "Terrible."])?;
/// for r in output.results {
///     println!("{} → {}", r.text, r.prediction?.label);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipeline<E: EmbeddingModel, C: SentimentClassifier> {
    pub(crate) normalizer: TextNormalizer,
    pub(crate) embedder: Arc<E>,
    pub(crate) classifier: Arc<C>,
}

impl<E: EmbeddingModel, C: SentimentClassifier> SentimentAnalysisPipeline<E, C> {
    /// Assemble a pipeline from already loaded parts.
    pub fn new(normalizer: TextNormalizer, embedder: Arc<E>, classifier: Arc<C>) -> Self {
        Self {
            normalizer,
            embedder,
            classifier,
        }
    }

    /// Normalize `raw_text` the way the pipeline does before embedding.
    pub fn clean_text(&self, raw_text: &str) -> Result<String> {
        self.normalizer.clean(raw_text)
    }

    /// Label for one review. Nothing is validated in between steps; every
    /// error propagates unchanged.
    pub fn predict_sentiment(&self, raw_text: &str) -> Result<Sentiment> {
        Ok(self.predict(raw_text)?.label)
    }

    /// Label, score and full distribution for one review.
    pub fn predict(&self, raw_text: &str) -> Result<Prediction> {
        let cleaned = self.normalizer.clean(raw_text)?;
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();

        let vector = self.embedder.infer_vector(&tokens)?;
        let width = vector.len();
        let row = Tensor::from_vec(vector, (1, width), self.classifier.device())?;

        let distribution = self
            .classifier
            .forward(&row)?
            .to_dtype(DType::F32)?
            .i(0)?
            .to_vec1::<f32>()?;

        let index = argmax(&distribution)
            .ok_or_else(|| PipelineError::Unexpected("Classifier returned no scores".into()))?;
        let label = Sentiment::from_index(index).ok_or_else(|| {
            PipelineError::Unexpected(format!(
                "Classifier returned {} classes, expected {}",
                distribution.len(),
                Sentiment::ALL.len()
            ))
        })?;
        let score = distribution[index];

        tracing::debug!(
            cleaned = %cleaned,
            tokens = tokens.len(),
            ?distribution,
            %label,
            "predicted sentiment"
        );

        Ok(Prediction {
            label,
            score,
            distribution,
        })
    }

    /// Analyze review sentiment.
    ///
    /// Single input → [`Output`], batch → [`BatchOutput`] with one result per
    /// text.
    pub fn run<'a, I: SentimentInput<'a>>(&self, input: I) -> Result<I::Output> {
        let stats_builder = PipelineStats::start();
        let texts = input.into_texts();
        let item_count = texts.len();

        let predictions: Vec<Result<Prediction>> =
            texts.iter().map(|text| self.predict(text)).collect();

        I::convert_output(texts, predictions, stats_builder.finish(item_count))
    }

    /// The normalizer in use.
    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Shared embedding model.
    pub fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }

    /// Shared classifier.
    pub fn classifier(&self) -> &Arc<C> {
        &self.classifier
    }

    /// Returns the device (CPU/GPU) the classifier is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.classifier.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5, 0.0]), Some(0));
        assert_eq!(argmax(&[0.1, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.1, 0.1, 0.8]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_returns_first_nan() {
        assert_eq!(argmax(&[0.2, f32::NAN, 0.9]), Some(1));
        assert_eq!(argmax(&[f32::NAN, 0.9, f32::NAN]), Some(0));
        assert_eq!(argmax(&[0.9, 0.1, f32::NAN]), Some(2));
    }

    #[test]
    fn labels_display_exactly() {
        let names: Vec<String> = Sentiment::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["Positive", "Neutral", "Negative"]);
        assert_eq!(Sentiment::from_index(3), None);
    }
}
