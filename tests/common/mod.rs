//! Writes small Doc2Vec and BiLSTM artifacts to disk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use sentilyze::error::Result;
use sentilyze::sentiment::{BiLstmClassifier, BiLstmConfig};

pub const VECTOR_SIZE: usize = 8;

pub const VOCAB: &[&str] = &[
    "great", "love", "terrible", "awful", "okay", "movie", "phone", "battery", "service",
];

pub fn write_doc2vec(dir: &Path, mode: &str) -> Result<()> {
    let vocab: Vec<serde_json::Value> = VOCAB
        .iter()
        .enumerate()
        .map(|(i, word)| serde_json::json!({ "word": word, "count": 5 + i }))
        .collect();
    let config = serde_json::json!({
        "vector_size": VECTOR_SIZE,
        "mode": mode,
        "window": 3,
        "negative": 3,
        "epochs": 15,
        "seed": 11,
        "vocab": vocab,
    });
    std::fs::write(dir.join("config.json"), serde_json::to_string_pretty(&config)?)?;

    let values = |offset: f32| -> Vec<f32> {
        (0..VOCAB.len() * VECTOR_SIZE)
            .map(|i| ((i as f32 + offset) * 0.61).sin() * 0.3)
            .collect()
    };
    let shape = (VOCAB.len(), VECTOR_SIZE);
    let tensors = HashMap::from([
        (
            "word_vectors".to_string(),
            Tensor::from_vec(values(0.0), shape, &Device::Cpu)?,
        ),
        (
            "output_weights".to_string(),
            Tensor::from_vec(values(1.5), shape, &Device::Cpu)?,
        ),
    ]);
    candle_core::safetensors::save(&tensors, dir.join("model.safetensors"))?;
    Ok(())
}

pub fn write_bilstm(dir: &Path, input_size: usize, labels: Option<&[&str]>) -> Result<()> {
    let mut config = serde_json::json!({
        "input_size": input_size,
        "timesteps": 2,
        "hidden_size": 4,
        "dense_size": 6,
    });
    if let Some(labels) = labels {
        config["labels"] = serde_json::json!(labels);
    }
    std::fs::write(dir.join("config.json"), serde_json::to_string_pretty(&config)?)?;

    // Random-initialized weights with the names the loader expects.
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let config: BiLstmConfig = serde_json::from_value(config)?;
    BiLstmClassifier::new(config, vb)?;
    varmap.save(dir.join("model.safetensors"))?;
    Ok(())
}
