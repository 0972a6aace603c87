//! Pipeline behavior with substituted embedding models and classifiers.

use std::sync::{Arc, Mutex};

use candle_core::{Device, Tensor};
use sentilyze::error::{PipelineError, Result};
use sentilyze::normalizer::TextNormalizer;
use sentilyze::sentiment::{
    EmbeddingModel, Sentiment, SentimentAnalysisPipeline, SentimentClassifier,
};

/// Returns `[1, 0, 0, ...]` and records the tokens it was asked about.
struct FixedEmbedding {
    size: usize,
    seen: Mutex<Vec<Vec<String>>>,
}

impl FixedEmbedding {
    fn new(size: usize) -> Self {
        Self {
            size,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl EmbeddingModel for FixedEmbedding {
    fn infer_vector(&self, tokens: &[&str]) -> Result<Vec<f32>> {
        self.seen
            .lock()
            .unwrap()
            .push(tokens.iter().map(|t| t.to_string()).collect());
        let mut v = vec![0.0; self.size];
        v[0] = 1.0;
        Ok(v)
    }

    fn vector_size(&self) -> usize {
        self.size
    }
}

struct FailingEmbedding;

impl EmbeddingModel for FailingEmbedding {
    fn infer_vector(&self, _tokens: &[&str]) -> Result<Vec<f32>> {
        Err(PipelineError::Unexpected("embedding backend down".into()))
    }

    fn vector_size(&self) -> usize {
        4
    }
}

/// Returns the same distribution for every input of the right width.
struct FixedClassifier {
    input_size: usize,
    distribution: [f32; 3],
    device: Device,
}

impl FixedClassifier {
    fn new(input_size: usize, distribution: [f32; 3]) -> Self {
        Self {
            input_size,
            distribution,
            device: Device::Cpu,
        }
    }
}

impl SentimentClassifier for FixedClassifier {
    fn forward(&self, embedding: &Tensor) -> Result<Tensor> {
        let (_, width) = embedding.dims2()?;
        if width != self.input_size {
            return Err(PipelineError::ShapeMismatch {
                expected: self.input_size,
                actual: width,
            });
        }
        Ok(Tensor::new(&[self.distribution], &self.device)?)
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

fn pipeline(
    distribution: [f32; 3],
) -> SentimentAnalysisPipeline<FixedEmbedding, FixedClassifier> {
    SentimentAnalysisPipeline::new(
        TextNormalizer::english(),
        Arc::new(FixedEmbedding::new(4)),
        Arc::new(FixedClassifier::new(4, distribution)),
    )
}

#[test]
fn highest_first_column_is_positive() -> Result<()> {
    let label = pipeline([0.7, 0.2, 0.1]).predict_sentiment("Loved every minute")?;
    assert_eq!(label, Sentiment::Positive);
    assert_eq!(label.to_string(), "Positive");
    Ok(())
}

#[test]
fn highest_last_column_is_negative() -> Result<()> {
    let label = pipeline([0.1, 0.1, 0.8]).predict_sentiment("Broke after a day")?;
    assert_eq!(label, Sentiment::Negative);
    Ok(())
}

#[test]
fn highest_middle_column_is_neutral() -> Result<()> {
    let label = pipeline([0.2, 0.6, 0.2]).predict_sentiment("It arrived")?;
    assert_eq!(label, Sentiment::Neutral);
    Ok(())
}

#[test]
fn exact_tie_goes_to_lowest_index() -> Result<()> {
    let label = pipeline([0.5, 0.5, 0.0]).predict_sentiment("Fine I guess")?;
    assert_eq!(label, Sentiment::Positive);
    Ok(())
}

#[test]
fn labels_come_from_the_fixed_set() -> Result<()> {
    for distribution in [[0.3, 0.3, 0.4], [0.0, 1.0, 0.0], [0.9, 0.05, 0.05]] {
        let label = pipeline(distribution).predict_sentiment("great phone terrible battery")?;
        assert!(["Positive", "Neutral", "Negative"].contains(&label.as_str()));
    }
    Ok(())
}

#[test]
fn prediction_carries_score_and_distribution() -> Result<()> {
    let prediction = pipeline([0.1, 0.3, 0.6]).predict("Disappointing")?;
    assert_eq!(prediction.label, Sentiment::Negative);
    assert!((prediction.score - 0.6).abs() < 1e-6);
    assert_eq!(prediction.distribution.len(), 3);
    Ok(())
}

#[test]
fn embedding_sees_cleaned_tokens() -> Result<()> {
    let embedder = Arc::new(FixedEmbedding::new(4));
    let pipeline = SentimentAnalysisPipeline::new(
        TextNormalizer::english(),
        Arc::clone(&embedder),
        Arc::new(FixedClassifier::new(4, [0.7, 0.2, 0.1])),
    );

    pipeline.predict_sentiment("The PHONES were amazing!!! 😍 http://shop.example 10/10")?;
    pipeline.predict_sentiment("")?;

    let seen = embedder.seen.lock().unwrap();
    assert_eq!(seen[0], vec!["phone", "amazing"]);
    assert!(seen[1].is_empty());
    Ok(())
}

#[test]
fn empty_input_is_not_guarded() -> Result<()> {
    let pipeline = pipeline([0.2, 0.5, 0.3]);
    assert_eq!(pipeline.clean_text("")?, "");
    assert_eq!(pipeline.predict_sentiment("   ")?, Sentiment::Neutral);
    Ok(())
}

#[test]
fn width_mismatch_propagates() {
    let pipeline = SentimentAnalysisPipeline::new(
        TextNormalizer::english(),
        Arc::new(FixedEmbedding::new(5)),
        Arc::new(FixedClassifier::new(4, [0.7, 0.2, 0.1])),
    );

    let err = pipeline.predict_sentiment("good").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ShapeMismatch {
            expected: 4,
            actual: 5
        }
    ));
}

#[test]
fn embedding_errors_propagate() {
    let pipeline = SentimentAnalysisPipeline::new(
        TextNormalizer::english(),
        Arc::new(FailingEmbedding),
        Arc::new(FixedClassifier::new(4, [0.7, 0.2, 0.1])),
    );
    assert!(matches!(
        pipeline.predict_sentiment("good"),
        Err(PipelineError::Unexpected(_))
    ));
}

#[test]
fn run_single_and_batch() -> Result<()> {
    let pipeline = pipeline([0.1, 0.2, 0.7]);

    let output = pipeline.run("Never again")?;
    assert_eq!(output.prediction.label, Sentiment::Negative);
    assert_eq!(output.stats.items_processed, 1);

    let output = pipeline.run(&["Awful", "", "Meh"])?;
    assert_eq!(output.results.len(), 3);
    assert_eq!(output.stats.items_processed, 3);
    assert_eq!(output.results[1].text, "");
    for r in output.results {
        assert_eq!(r.prediction?.label, Sentiment::Negative);
    }
    Ok(())
}

#[test]
fn batch_keeps_per_item_errors() -> Result<()> {
    let pipeline = SentimentAnalysisPipeline::new(
        TextNormalizer::english(),
        Arc::new(FixedEmbedding::new(3)),
        Arc::new(FixedClassifier::new(4, [0.7, 0.2, 0.1])),
    );

    let texts: &[&str] = &["one", "two"];
    let output = pipeline.run(texts)?;
    assert!(output
        .results
        .iter()
        .all(|r| matches!(r.prediction, Err(PipelineError::ShapeMismatch { .. }))));

    assert!(pipeline.run("one").is_err());
    Ok(())
}
