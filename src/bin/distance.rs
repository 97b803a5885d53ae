use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array1;

use word2vec::dictionary::normalize;
use word2vec::{VectorFormat, VectorizedDictionary, WordComparator};

#[derive(Parser)]
#[command(about = "Show the words closest to a word or sentence", long_about = None)]
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
    'outer: loop {
        print!("Enter word or sentence (EXIT to break): ");
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

        let mut bi: Vec<usize> = vec![];
        for word in line.split_whitespace() {
            println!();
            print!("Word: {word}  Position in vocabulary: ");
            match dictionary.position(word) {
                None => {
                    println!("None");
                    println!("Out of dictionary word!");
                    continue 'outer;
                }
                Some(i) => {
                    println!("{i}");
                    bi.push(i);
                }
            }
        }
        if bi.is_empty() {
            continue;
        }

        println!();
        println!("                                              Word       Cosine distance");
        println!("------------------------------------------------------------------------");

        let mut vec = Array1::<f32>::zeros(dictionary.dimension());
        for &i in &bi {
            vec += &dictionary.word(i).vector();
        }
        normalize(&mut vec);

        for (word, dist) in dictionary.most_similar(vec.view(), &bi, options.count)? {
            println!("{:>50}\t\t{:8.6}", word, dist);
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
