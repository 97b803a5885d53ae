use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;

use word2vec::{SemanticDataSet, VectorFormat, VectorizedDictionary, WordComparator};

#[derive(Parser)]
#[command(about = "score word vectors against human word-similarity judgments", long_about = None)]
struct Options {
    /// Word vectors to evaluate
    #[arg(long = "vectors", value_name = "FILE")]
    vectors_file: PathBuf,

    /// Layout of the vectors file
    #[arg(long, value_enum, default_value_t = VectorFormat::Text)]
    format: VectorFormat,

    /// Word order used when the vectors file was written
    #[arg(long, value_enum, default_value_t = WordComparator::English)]
    comparator: WordComparator,

    /// Data sets with one `word1 word2 score` line per pair
    #[arg(value_name = "DATASET", required = true)]
    data_sets: Vec<PathBuf>,
}

fn evaluate(options: &Options) -> Result<()> {
    let dictionary =
        VectorizedDictionary::load(&options.vectors_file, options.format, options.comparator)?;
    println!("{:<40} {:>8} {:>8}", "data set", "pairs", "spearman");
    for file in &options.data_sets {
        let mut human = SemanticDataSet::load(file)?;
        let total = human.size();
        let computed = human.calculate_similarities(&dictionary);
        println!(
            "{:<40} {:>8} {:>8.4}",
            file.display(),
            format!("{}/{}", computed.size(), total),
            human.spearman_correlation(&computed)
        );
    }
    Ok(())
}

fn main() {
    let options = Options::parse();
    if let Err(err) = evaluate(&options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
