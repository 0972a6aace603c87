use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::rnn::Direction;
use candle_nn::{linear, lstm, LSTMConfig, Linear, Module, VarBuilder, LSTM, RNN};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::loaders::{load_config, ArtifactSource, WEIGHTS_FILE};
use crate::pipelines::cache::ModelOptions;
use crate::pipelines::sentiment::model::SentimentClassifier;
use crate::pipelines::sentiment::Sentiment;

fn default_timesteps() -> usize {
    1
}

/// `config.json` of a BiLSTM classifier artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct BiLstmConfig {
    /// Width of the embedding row the classifier accepts.
    pub input_size: usize,
    /// The row is read as `timesteps` steps of `input_size / timesteps` features.
    #[serde(default = "default_timesteps")]
    pub timesteps: usize,
    /// Hidden size of each LSTM direction.
    pub hidden_size: usize,
    /// Optional ReLU dense layer between the LSTM and the output layer.
    #[serde(default)]
    pub dense_size: Option<usize>,
    /// Class names the model was trained with, in output order, if recorded.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// Options identifying a classifier in the cache.
#[derive(Debug, Clone)]
pub struct BiLstmOptions {
    pub source: ArtifactSource,
}

impl ModelOptions for BiLstmOptions {
    fn cache_key(&self) -> String {
        format!("bilstm-{}", self.source.cache_key())
    }
}

/// Pretrained bidirectional LSTM over a document embedding.
///
/// Weights use candle-nn names: `lstm.weight_ih_l0`, `lstm.weight_ih_l0_reverse`
/// (and the matching `weight_hh`/`bias_*`), `dense.weight`/`dense.bias` when a
/// dense layer is configured, and `output.weight`/`output.bias`.
pub struct BiLstmClassifier {
    config: BiLstmConfig,
    forward: LSTM,
    backward: LSTM,
    dense: Option<Linear>,
    output: Linear,
    device: Device,
}

impl BiLstmClassifier {
    /// Build the network from `config`, reading weights through `vb`.
    pub fn new(config: BiLstmConfig, vb: VarBuilder) -> Result<Self> {
        if config.timesteps == 0 || config.input_size % config.timesteps != 0 {
            return Err(PipelineError::ModelLoad(format!(
                "input_size {} cannot be split into {} timesteps",
                config.input_size, config.timesteps
            )));
        }
        let features = config.input_size / config.timesteps;
        let device = vb.device().clone();

        let forward = lstm(
            features,
            config.hidden_size,
            LSTMConfig::default(),
            vb.pp("lstm"),
        )?;
        let backward = lstm(
            features,
            config.hidden_size,
            LSTMConfig {
                direction: Direction::Backward,
                ..LSTMConfig::default()
            },
            vb.pp("lstm"),
        )?;

        let mut width = 2 * config.hidden_size;
        let dense = match config.dense_size {
            Some(size) => {
                let layer = linear(width, size, vb.pp("dense"))?;
                width = size;
                Some(layer)
            }
            None => None,
        };
        let output = linear(width, Sentiment::ALL.len(), vb.pp("output"))?;

        if let Some(labels) = &config.labels {
            let expected: Vec<&str> = Sentiment::ALL.iter().map(|s| s.as_str()).collect();
            let matches = labels.len() == expected.len()
                && labels
                    .iter()
                    .zip(&expected)
                    .all(|(declared, fixed)| declared.eq_ignore_ascii_case(fixed));
            if !matches {
                tracing::warn!(
                    declared = ?labels,
                    assumed = ?expected,
                    "classifier declares a label order different from the one used for predictions"
                );
            }
        }

        Ok(Self {
            config,
            forward,
            backward,
            dense,
            output,
            device,
        })
    }

    pub(crate) fn load(options: &BiLstmOptions, device: &Device) -> Result<Self> {
        let config: BiLstmConfig = load_config(&options.source)?;
        let weights_path = options.source.resolve(WEIGHTS_FILE)?;
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };
        let model = Self::new(config, vb).map_err(|e| match e {
            PipelineError::Unexpected(msg) => {
                PipelineError::ModelLoad(format!("Invalid classifier weights: {msg}"))
            }
            other => other,
        })?;

        tracing::info!(
            input_size = model.config.input_size,
            hidden_size = model.config.hidden_size,
            device = ?device.location(),
            "loaded BiLSTM classifier"
        );
        Ok(model)
    }

    /// Model configuration.
    pub fn config(&self) -> &BiLstmConfig {
        &self.config
    }
}

// Final hidden state after running `lstm` over the steps of `xs`.
fn final_hidden(lstm: &LSTM, xs: &Tensor, reverse: bool) -> candle_core::Result<Tensor> {
    let (rows, steps, _) = xs.dims3()?;
    let mut state = lstm.zero_state(rows)?;
    for i in 0..steps {
        let t = if reverse { steps - 1 - i } else { i };
        let x = xs.i((.., t, ..))?.contiguous()?;
        state = lstm.step(&x, &state)?;
    }
    Ok(state.h().clone())
}

impl SentimentClassifier for BiLstmClassifier {
    fn forward(&self, embedding: &Tensor) -> Result<Tensor> {
        let (rows, width) = match embedding.dims() {
            [rows, width] => (*rows, *width),
            [width] => (1, *width),
            dims => {
                return Err(PipelineError::ShapeMismatch {
                    expected: self.config.input_size,
                    actual: dims.iter().product(),
                })
            }
        };
        if width != self.config.input_size {
            return Err(PipelineError::ShapeMismatch {
                expected: self.config.input_size,
                actual: width,
            });
        }

        let features = self.config.input_size / self.config.timesteps;
        let xs = embedding
            .to_device(&self.device)?
            .to_dtype(DType::F32)?
            .reshape((rows, self.config.timesteps, features))?;

        let fwd = final_hidden(&self.forward, &xs, false)?;
        let bwd = final_hidden(&self.backward, &xs, true)?;
        let mut hidden = Tensor::cat(&[&fwd, &bwd], D::Minus1)?;
        if let Some(dense) = &self.dense {
            hidden = dense.forward(&hidden)?.relu()?;
        }
        let logits = self.output.forward(&hidden)?;
        Ok(softmax(&logits, D::Minus1)?)
    }

    fn input_size(&self) -> usize {
        self.config.input_size
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    fn classifier(dense_size: Option<usize>) -> BiLstmClassifier {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = BiLstmConfig {
            input_size: 8,
            timesteps: 2,
            hidden_size: 3,
            dense_size,
            labels: None,
        };
        BiLstmClassifier::new(config, vb).unwrap()
    }

    #[test]
    fn outputs_three_way_distribution() {
        let model = classifier(Some(4));
        let row = Tensor::new(&[[0.1f32, -0.2, 0.3, 0.0, 0.5, -0.1, 0.2, 0.4]], &Device::Cpu)
            .unwrap();
        let probs = model.forward(&row).unwrap();
        assert_eq!(probs.dims(), &[1, 3]);

        let probs = probs.to_vec2::<f32>().unwrap();
        let total: f32 = probs[0].iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(probs[0].iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn works_without_dense_layer() {
        let model = classifier(None);
        let row = Tensor::zeros((1, 8), DType::F32, &Device::Cpu).unwrap();
        assert_eq!(model.forward(&row).unwrap().dims(), &[1, 3]);
    }

    #[test]
    fn wrong_width_is_a_shape_mismatch() {
        let model = classifier(None);
        let row = Tensor::zeros((1, 5), DType::F32, &Device::Cpu).unwrap();
        let err = model.forward(&row).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShapeMismatch {
                expected: 8,
                actual: 5
            }
        ));
    }

    #[test]
    fn rejects_uneven_timesteps() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = BiLstmConfig {
            input_size: 7,
            timesteps: 2,
            hidden_size: 3,
            dense_size: None,
            labels: None,
        };
        assert!(matches!(
            BiLstmClassifier::new(config, vb),
            Err(PipelineError::ModelLoad(_))
        ));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logs_while_building(labels: &[&str]) -> String {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
            let config = BiLstmConfig {
                input_size: 4,
                timesteps: 1,
                hidden_size: 2,
                dense_size: None,
                labels: Some(labels.iter().map(|l| l.to_string()).collect()),
            };
            BiLstmClassifier::new(config, vb).unwrap();
        });

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn warns_on_declared_label_order_mismatch() {
        let logs = logs_while_building(&["negative", "neutral", "positive"]);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("label order"), "{logs}");
    }

    #[test]
    fn declared_labels_in_fixed_order_log_nothing() {
        let logs = logs_while_building(&["positive", "Neutral", "NEGATIVE"]);
        assert!(!logs.contains("label order"), "{logs}");
    }
}
