pub mod bilstm;
pub mod doc2vec;

pub use bilstm::{BiLstmClassifier, BiLstmConfig};
pub use doc2vec::{Doc2VecConfig, Doc2VecMode, Doc2VecModel, VocabEntry};
