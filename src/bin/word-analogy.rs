use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use word2vec::{Error, VectorFormat, VectorizedDictionary, WordComparator};

#[derive(Parser)]
#[command(about = "Complete analogies: A is to B as C is to ?", long_about = None)]
struct Options {
    /// Contains word projections
    #[arg(value_name = "FILE")]
    file_name: PathBuf,

    /// Layout of FILE
    #[arg(long, value_enum, default_value_t = VectorFormat::Text)]
    format: VectorFormat,

    /// Word order used when FILE was written
    #[arg(long, value_enum, default_value_t = WordComparator::English)]
    comparator: WordComparator,

    /// Number of closest words that will be shown
    #[arg(short = 'n', default_value_t = 40)]
    count: usize,
}

fn run(options: &Options) -> Result<()> {
    let dictionary =
        VectorizedDictionary::load(&options.file_name, options.format, options.comparator)?;

    let mut line = String::new();
    loop {
        print!("Enter three words (EXIT to break): ");
        let _ = std::io::stdout().flush();

        line.clear();
        if std::io::stdin()
            .read_line(&mut line)
            .context("error reading stdin")?
            == 0
        {
            break;
        }
        if line.trim() == "EXIT" {
            break;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let [a, b, c] = words[..] else {
            println!(
                "{} words were entered.. three words are needed at the input to perform the calculation",
                words.len()
            );
            continue;
        };

        match dictionary.analogy(a, b, c, options.count) {
            Err(Error::UnknownWord(word)) => {
                println!();
                println!("Word: {word}  Position in vocabulary: None");
                println!("Out of dictionary word!");
            }
            Err(err) => return Err(err.into()),
            Ok(best) => {
                println!();
                println!("                                              Word       Cosine distance");
                println!("------------------------------------------------------------------------");
                for (word, dist) in best {
                    println!("{:>50}\t\t{:8.6}", word, dist);
                }
            }
        }
    }
    Ok(())
}

fn main() {
    let options = Options::parse();
    if let Err(err) = run(&options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
