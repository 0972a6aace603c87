use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::loaders::{load_config, ArtifactSource, WEIGHTS_FILE};
use crate::pipelines::cache::ModelOptions;
use crate::pipelines::sentiment::model::EmbeddingModel;

/// Exponent applied to word counts when building the negative-sampling table.
const NS_EXPONENT: f64 = 0.75;

/// Paragraph-vector training mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Doc2VecMode {
    /// Distributed bag of words: the doc vector alone predicts each word.
    Dbow,
    /// Distributed memory: the doc vector and context words together predict
    /// the centre word. See [`Doc2VecConfig::dm_mean`].
    Dm,
}

/// One vocabulary entry, in weight-row order.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabEntry {
    /// The word.
    pub word: String,
    /// Training corpus frequency.
    pub count: u64,
}

fn default_window() -> usize {
    5
}

fn default_negative() -> usize {
    5
}

fn default_epochs() -> usize {
    10
}

fn default_alpha() -> f32 {
    0.025
}

fn default_min_alpha() -> f32 {
    0.0001
}

fn default_seed() -> u64 {
    1
}

/// `config.json` of a Doc2Vec artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct Doc2VecConfig {
    /// Embedding width.
    pub vector_size: usize,
    /// Training mode.
    pub mode: Doc2VecMode,
    /// PV-DM only. `true` averages the doc and context vectors and applies the
    /// full error to the doc vector; `false` sums them and divides the error by
    /// the number of summed vectors.
    #[serde(default)]
    pub dm_mean: bool,
    /// Max distance between centre and context word (PV-DM).
    #[serde(default = "default_window")]
    pub window: usize,
    /// Noise words drawn per positive example.
    #[serde(default = "default_negative")]
    pub negative: usize,
    /// Inference passes over the document.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Starting learning rate.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Final learning rate.
    #[serde(default = "default_min_alpha")]
    pub min_alpha: f32,
    /// Base seed for the initial doc vector and noise sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Vocabulary, one entry per weight row.
    pub vocab: Vec<VocabEntry>,
}

/// Options identifying a Doc2Vec model in the cache.
#[derive(Debug, Clone)]
pub struct Doc2VecOptions {
    pub source: ArtifactSource,
    pub epochs: Option<usize>,
    pub seed: Option<u64>,
}

impl ModelOptions for Doc2VecOptions {
    fn cache_key(&self) -> String {
        format!(
            "doc2vec-{}-epochs{:?}-seed{:?}",
            self.source.cache_key(),
            self.epochs,
            self.seed
        )
    }
}

// FNV-1a, stable across runs and platforms.
fn stable_hash(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Pretrained paragraph-vector model with on-the-fly inference.
///
/// Word vectors and output weights stay frozen; only the vector of the
/// unseen document is trained, by negative sampling.
pub struct Doc2VecModel {
    config: Doc2VecConfig,
    index: HashMap<String, usize>,
    word_vectors: Vec<f32>,
    output_weights: Vec<f32>,
    noise_table: Vec<u64>,
}

impl Doc2VecModel {
    /// Build a model from a config and row-major `(vocab, vector_size)` weights.
    pub fn new(
        config: Doc2VecConfig,
        word_vectors: Vec<f32>,
        output_weights: Vec<f32>,
    ) -> Result<Self> {
        let expected = config.vocab.len() * config.vector_size;
        for (name, len) in [
            ("word_vectors", word_vectors.len()),
            ("output_weights", output_weights.len()),
        ] {
            if len != expected {
                return Err(PipelineError::ModelLoad(format!(
                    "Doc2Vec tensor '{name}' has {len} values, expected {} x {}",
                    config.vocab.len(),
                    config.vector_size
                )));
            }
        }
        if config.vector_size == 0 {
            return Err(PipelineError::ModelLoad(
                "Doc2Vec vector_size must be positive".into(),
            ));
        }

        let index = config
            .vocab
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.word.clone(), i))
            .collect();

        // Cumulative unigram^0.75 table, scaled to integers like word2vec's.
        let train_words_pow: f64 = config
            .vocab
            .iter()
            .map(|e| (e.count as f64).powf(NS_EXPONENT))
            .sum();
        let mut cumulative = 0.0;
        let noise_table = config
            .vocab
            .iter()
            .map(|e| {
                cumulative += (e.count as f64).powf(NS_EXPONENT);
                ((cumulative / train_words_pow.max(f64::MIN_POSITIVE)) * u32::MAX as f64).round()
                    as u64
            })
            .collect();

        Ok(Self {
            config,
            index,
            word_vectors,
            output_weights,
            noise_table,
        })
    }

    /// Load `config.json` and `model.safetensors` (tensors `word_vectors` and
    /// `output_weights`) from an artifact.
    pub(crate) fn load(options: &Doc2VecOptions) -> Result<Self> {
        let mut config: Doc2VecConfig = load_config(&options.source)?;
        if let Some(epochs) = options.epochs {
            config.epochs = epochs;
        }
        if let Some(seed) = options.seed {
            config.seed = seed;
        }

        let weights_path = options.source.resolve(WEIGHTS_FILE)?;
        let mut tensors = candle_core::safetensors::load(&weights_path, &Device::Cpu)
            .map_err(|e| {
                PipelineError::ModelLoad(format!(
                    "Failed to read '{}': {}",
                    weights_path.display(),
                    e
                ))
            })?;
        let mut take = |name: &str| -> Result<Vec<f32>> {
            let tensor: Tensor = tensors.remove(name).ok_or_else(|| {
                PipelineError::ModelLoad(format!(
                    "Tensor '{name}' missing from '{}'",
                    weights_path.display()
                ))
            })?;
            Ok(tensor.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?)
        };
        let word_vectors = take("word_vectors")?;
        let output_weights = take("output_weights")?;

        tracing::info!(
            vocab = config.vocab.len(),
            vector_size = config.vector_size,
            mode = ?config.mode,
            "loaded Doc2Vec model"
        );
        Self::new(config, word_vectors, output_weights)
    }

    /// Model configuration.
    pub fn config(&self) -> &Doc2VecConfig {
        &self.config
    }

    fn row<'a>(&self, weights: &'a [f32], index: usize) -> &'a [f32] {
        let n = self.config.vector_size;
        &weights[index * n..(index + 1) * n]
    }

    fn sample_noise(&self, rng: &mut StdRng) -> usize {
        let total = self.noise_table.last().copied().unwrap_or(0);
        if total == 0 {
            return rng.random_range(0..self.noise_table.len());
        }
        let target = rng.random_range(0..total);
        self.noise_table
            .partition_point(|&bound| bound <= target)
            .min(self.noise_table.len() - 1)
    }

    /// Negative-sampling step: push `hidden` toward predicting `word` and away
    /// from noise words. Returns the error gradient for `hidden`.
    fn train_pair(&self, hidden: &[f32], word: usize, alpha: f32, rng: &mut StdRng) -> Vec<f32> {
        let mut gradient = vec![0.0; self.config.vector_size];
        let mut update = |target: usize, label: f32| {
            let out = self.row(&self.output_weights, target);
            let g = (label - sigmoid(dot(hidden, out))) * alpha;
            for (acc, w) in gradient.iter_mut().zip(out) {
                *acc += g * w;
            }
        };

        update(word, 1.0);
        for _ in 0..self.config.negative {
            let noise = self.sample_noise(rng);
            if noise != word {
                update(noise, 0.0);
            }
        }
        gradient
    }

    fn train_dbow(&self, doc: &mut [f32], words: &[usize], alpha: f32, rng: &mut StdRng) {
        for &word in words {
            let gradient = self.train_pair(doc, word, alpha, rng);
            for (d, g) in doc.iter_mut().zip(gradient) {
                *d += g;
            }
        }
    }

    fn train_dm(&self, doc: &mut [f32], words: &[usize], alpha: f32, rng: &mut StdRng) {
        let n = self.config.vector_size;
        for (pos, &word) in words.iter().enumerate() {
            let reduced = rng.random_range(0..self.config.window.max(1));
            let reach = self.config.window.saturating_sub(reduced);
            let start = pos.saturating_sub(reach);
            let end = (pos + reach + 1).min(words.len());

            let mut hidden = doc.to_vec();
            let mut count = 1.0;
            for (ctx_pos, &ctx) in words.iter().enumerate().take(end).skip(start) {
                if ctx_pos == pos {
                    continue;
                }
                for (h, w) in hidden.iter_mut().zip(self.row(&self.word_vectors, ctx)) {
                    *h += w;
                }
                count += 1.0;
            }
            let scale = if self.config.dm_mean {
                for h in hidden.iter_mut().take(n) {
                    *h /= count;
                }
                1.0
            } else {
                1.0 / count
            };

            let gradient = self.train_pair(&hidden, word, alpha, rng);
            for (d, g) in doc.iter_mut().zip(gradient) {
                *d += g * scale;
            }
        }
    }
}

impl EmbeddingModel for Doc2VecModel {
    fn infer_vector(&self, tokens: &[&str]) -> Result<Vec<f32>> {
        let n = self.config.vector_size;
        let seed = stable_hash(&tokens.join(" ")) ^ self.config.seed;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut doc: Vec<f32> = (0..n)
            .map(|_| (rng.random::<f32>() - 0.5) / n as f32)
            .collect();

        // Out-of-vocabulary tokens are skipped.
        let words: Vec<usize> = tokens
            .iter()
            .filter_map(|t| self.index.get(*t).copied())
            .collect();
        if words.is_empty() {
            return Ok(doc);
        }

        let epochs = self.config.epochs;
        let alpha_delta =
            (self.config.alpha - self.config.min_alpha) / epochs.saturating_sub(1).max(1) as f32;
        let mut alpha = self.config.alpha;
        for _ in 0..epochs {
            match self.config.mode {
                Doc2VecMode::Dbow => self.train_dbow(&mut doc, &words, alpha, &mut rng),
                Doc2VecMode::Dm => self.train_dm(&mut doc, &words, alpha, &mut rng),
            }
            alpha -= alpha_delta;
        }

        Ok(doc)
    }

    fn vector_size(&self) -> usize {
        self.config.vector_size
    }
}
