//! Classify reviews from the command line.
//!
//! ```text
//! cargo run --example sentiment_analysis -- models/doc2vec models/bilstm "Loved it!"
//! ```
//!
//! Without a review argument, reviews are read from stdin, one per line.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use sentilyze::error::Result;
use sentilyze::sentiment::SentimentAnalysisPipelineBuilder;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sentiment_analysis")]
#[command(about = "Classify review sentiment as Positive, Neutral or Negative")]
struct Args {
    /// Directory holding the Doc2Vec `config.json` and `model.safetensors`
    doc2vec_dir: PathBuf,

    /// Directory holding the BiLSTM `config.json` and `model.safetensors`
    bilstm_dir: PathBuf,

    /// Review to classify; read from stdin when omitted
    review: Option<String>,

    /// Run the classifier on this CUDA device instead of the CPU
    #[arg(long)]
    cuda: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Building pipeline...");
    let mut builder =
        SentimentAnalysisPipelineBuilder::from_dirs(args.doc2vec_dir, args.bilstm_dir);
    if let Some(index) = args.cuda {
        builder = builder.cuda(index);
    }
    let pipeline = builder.build()?;
    println!("Pipeline built successfully.");

    let reviews: Vec<String> = match args.review {
        Some(review) => vec![review],
        None => std::io::stdin().lock().lines().collect::<std::io::Result<_>>()?,
    };

    for review in reviews {
        // Empty input is rejected here, before it reaches the pipeline.
        if review.trim().is_empty() {
            println!("Please enter some review text.");
            continue;
        }

        let output = pipeline.run(review.as_str())?;
        println!(
            "Sentiment: {} (confidence: {:.4}, {:.2}ms)",
            output.prediction.label,
            output.prediction.score,
            output.stats.total_time.as_secs_f64() * 1000.0
        );
    }

    Ok(())
}
