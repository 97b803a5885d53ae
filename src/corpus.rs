//! Tokenized training text.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Longer sentences are split into chunks of this many words.
pub const MAX_SENTENCE_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    words: Vec<String>,
}

impl Sentence {
    pub fn new(words: Vec<String>) -> Self {
        Sentence { words }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Panics if `i` is out of range.
    pub fn word(&self, i: usize) -> &str {
        &self.words[i]
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True if `i` is a valid word position in this sentence.
    pub fn safe_index(&self, i: isize) -> bool {
        i >= 0 && (i as usize) < self.words.len()
    }
}

impl From<&str> for Sentence {
    fn from(text: &str) -> Self {
        Sentence::new(text.split_whitespace().map(str::to_string).collect())
    }
}

/// Ordered sentences plus the number of times each distinct word occurs.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    sentences: Vec<Sentence>,
    counts: HashMap<String, u64>,
    number_of_words: u64,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus::default()
    }

    /// Reads a corpus from a text file with one sentence per line and words
    /// separated by whitespace.
    pub fn load(file_name: &Path) -> Result<Self> {
        let f = BufReader::new(
            File::open(file_name)
                .with_context(|| format!("error opening training data file {file_name:?}"))?,
        );
        let mut corpus = Corpus::new();
        for line in f.lines() {
            let line = line.context("error reading training data file")?;
            corpus.add_sentence(Sentence::from(line.as_str()));
        }
        Ok(corpus)
    }

    /// Appends a sentence. Empty sentences are dropped.
    pub fn add_sentence(&mut self, sentence: Sentence) {
        if sentence.words.len() > MAX_SENTENCE_LENGTH {
            for chunk in sentence.words.chunks(MAX_SENTENCE_LENGTH) {
                self.push(Sentence::new(chunk.to_vec()));
            }
        } else if !sentence.words.is_empty() {
            self.push(sentence);
        }
    }

    fn push(&mut self, sentence: Sentence) {
        for word in &sentence.words {
            *self.counts.entry(word.clone()).or_insert(0) += 1;
        }
        self.number_of_words += sentence.words.len() as u64;
        self.sentences.push(sentence);
    }

    /// Total number of word occurrences.
    pub fn number_of_words(&self) -> u64 {
        self.number_of_words
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Panics if `i` is out of range.
    pub fn sentence(&self, i: usize) -> &Sentence {
        &self.sentences[i]
    }

    /// The distinct words, in no particular order.
    pub fn word_list(&self) -> impl Iterator<Item = &str> + '_ {
        self.counts.keys().map(String::as_str)
    }

    pub fn distinct_word_count(&self) -> usize {
        self.counts.len()
    }

    /// How many times `word` occurs; 0 if it never does.
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Puts the sentences in a new order that depends only on the current
    /// order and `seed`.
    pub fn shuffle_sentences(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.sentences.shuffle(&mut rng);
    }
}

impl FromIterator<Sentence> for Corpus {
    fn from_iter<I: IntoIterator<Item = Sentence>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        for sentence in iter {
            corpus.add_sentence(sentence);
        }
        corpus
    }
}
