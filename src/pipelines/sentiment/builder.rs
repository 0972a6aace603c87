use std::path::PathBuf;

use super::pipeline::SentimentAnalysisPipeline;
use crate::error::Result;
use crate::loaders::ArtifactSource;
use crate::models::bilstm::{BiLstmClassifier, BiLstmOptions};
use crate::models::doc2vec::{Doc2VecModel, Doc2VecOptions};
use crate::normalizer::TextNormalizerBuilder;
use crate::pipelines::cache::{global_cache, ModelOptions};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

/// Builder for the Doc2Vec + BiLSTM [`SentimentAnalysisPipeline`].
///
/// Models are loaded once per process and shared: building several pipelines
/// over the same artifacts reuses the same weights for as long as any of them
/// is alive.
///
/// ```rust,no_run
/// use sentilyze::sentiment::SentimentAnalysisPipelineBuilder;
///
/// # fn main() -> sentilyze::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::from_dirs("models/doc2vec", "models/bilstm")
///     .epochs(50)
///     .seed(42)
///     .stopwords(["product"])
///     .cpu()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipelineBuilder {
    embedding: Doc2VecOptions,
    classifier: BiLstmOptions,
    normalizer: TextNormalizerBuilder,
    device_request: DeviceRequest,
}

impl SentimentAnalysisPipelineBuilder {
    /// Doc2Vec embedding and BiLSTM classifier from the given artifact sources.
    pub fn doc2vec_bilstm(
        embedding: impl Into<ArtifactSource>,
        classifier: impl Into<ArtifactSource>,
    ) -> Self {
        Self {
            embedding: Doc2VecOptions {
                source: embedding.into(),
                epochs: None,
                seed: None,
            },
            classifier: BiLstmOptions {
                source: classifier.into(),
            },
            normalizer: TextNormalizerBuilder::default(),
            device_request: DeviceRequest::default(),
        }
    }

    /// Artifacts in two local directories.
    pub fn from_dirs(
        embedding_dir: impl Into<PathBuf>,
        classifier_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::doc2vec_bilstm(
            ArtifactSource::local(embedding_dir),
            ArtifactSource::local(classifier_dir),
        )
    }

    /// Artifacts in two Hugging Face Hub model repos.
    pub fn from_hub(embedding_repo: &str, classifier_repo: &str) -> Self {
        Self::doc2vec_bilstm(
            ArtifactSource::hub(embedding_repo),
            ArtifactSource::hub(classifier_repo),
        )
    }

    /// Override the number of Doc2Vec inference epochs.
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.embedding.epochs = Some(epochs);
        self
    }

    /// Override the Doc2Vec inference seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.embedding.seed = Some(seed);
        self
    }

    /// Extra stopwords for the normalizer.
    pub fn stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.normalizer = self.normalizer.stopwords(words);
        self
    }

    /// Extra JSON lemma lookup table for the normalizer.
    pub fn lemma_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.normalizer = self.normalizer.lemma_table(path);
        self
    }

    /// Use CPU for inference (default).
    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    /// Use a specific CUDA GPU for the classifier.
    pub fn cuda(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    /// Load (or reuse) both models and assemble the pipeline.
    pub fn build(self) -> Result<SentimentAnalysisPipeline<Doc2VecModel, BiLstmClassifier>> {
        let device = self.device_request.resolve()?;

        let embedder = global_cache().get_or_create(&self.embedding.cache_key(), || {
            Doc2VecModel::load(&self.embedding)
        })?;

        let key = build_cache_key(&self.classifier, &device);
        let classifier = global_cache().get_or_create(&key, || {
            BiLstmClassifier::load(&self.classifier, &device)
        })?;

        let normalizer = self.normalizer.build()?;

        Ok(SentimentAnalysisPipeline::new(normalizer, embedder, classifier))
    }
}
