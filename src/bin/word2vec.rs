use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};

use word2vec::{
    Algorithm, Corpus, LossFunction, NeuralNetwork, TrainingParameters, VectorFormat,
    WordComparator,
};

#[derive(Parser)]
#[command(about = "WORD VECTOR estimation toolkit", long_about = None, version)]
struct Options {
    /// Use text data from FILE to train the model, one sentence per line
    #[arg(long = "train", value_name = "FILE")]
    train_file: PathBuf,

    /// Use FILE to save the resulting word vectors
    #[arg(long = "output", value_name = "FILE")]
    output_file: PathBuf,

    /// Set size of word vectors
    #[arg(long = "size", default_value_t = 100)]
    layer_size: usize,

    /// Set max skip length between words
    #[arg(long, default_value_t = 5)]
    window: usize,

    /// Use Hierarchical Softmax instead of negative sampling
    #[arg(long)]
    hs: bool,

    /// Number of negative examples; common values are 3 - 10
    #[arg(long, default_value_t = 5)]
    negative: usize,

    /// Run this many training iterations
    #[arg(long, default_value_t = 3)]
    iter: usize,

    /// Set the starting learning rate
    #[arg(long, default_value_t = 0.025)]
    alpha: f32,

    /// Use the skip-gram model (otherwise, use continuous bag of words)
    #[arg(long)]
    skip_gram: bool,

    /// Seed for every random choice made during training
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Word order of the vocabulary and the output
    #[arg(long, value_enum, default_value_t = WordComparator::English)]
    comparator: WordComparator,

    /// Set the debug mode (default = 2 = more info during training)
    #[arg(long = "debug", default_value_t = 2)]
    debug_mode: usize,

    /// Save the resulting vectors in binary mode
    #[arg(long, group = "format")]
    binary: bool,

    /// Save the resulting dictionary in bincode format
    #[arg(long, group = "format")]
    bincode: bool,

    /// The vocabulary will be saved to FILE
    #[arg(long = "save-vocab", value_name = "FILE")]
    save_vocab_file: Option<PathBuf>,
}

impl Options {
    fn parameters(&self) -> TrainingParameters {
        TrainingParameters {
            layer_size: self.layer_size,
            algorithm: if self.skip_gram {
                Algorithm::SkipGram
            } else {
                Algorithm::Cbow
            },
            alpha: self.alpha,
            window: self.window,
            loss: if self.hs {
                LossFunction::HierarchicalSoftmax
            } else {
                LossFunction::NegativeSampling
            },
            negative: self.negative,
            iterations: self.iter,
            seed: self.seed,
            comparator: self.comparator,
        }
    }

    fn format(&self) -> VectorFormat {
        if self.binary {
            VectorFormat::Binary
        } else if self.bincode {
            VectorFormat::Bincode
        } else {
            VectorFormat::Text
        }
    }

    fn log_level(&self) -> Level {
        match self.debug_mode {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

fn train_model(options: &Options) -> Result<()> {
    info!(
        "Starting training using file {}",
        options.train_file.display()
    );
    let corpus = Corpus::load(&options.train_file)?;
    let network = NeuralNetwork::new(corpus, options.parameters())?;
    if let Some(f) = &options.save_vocab_file {
        network.vocabulary().save(f)?;
    }

    let progress = if options.debug_mode > 0 {
        let progress = ProgressBar::new(0);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>9}/{len:9} words {msg}")
                .context("invalid progress bar template")?,
        );
        progress
    } else {
        ProgressBar::hidden()
    };

    let start = Instant::now();
    let dictionary = network.train_with_progress(&progress)?;
    info!(
        words = dictionary.len(),
        seconds = start.elapsed().as_secs_f64(),
        "training finished"
    );

    dictionary.save(&options.output_file, options.format())?;
    Ok(())
}

fn main() {
    let options = Options::parse();

    tracing_subscriber::fmt()
        .with_max_level(options.log_level())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = train_model(&options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
