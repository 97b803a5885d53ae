//! Errors reported by vocabulary construction and training.

use thiserror::Error;

use crate::vocabulary::MAX_CODE_LENGTH;

#[derive(Error, Debug)]
pub enum Error {
    /// The corpus has no sentences, so there is nothing to train on.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// The Huffman tree needs at least two leaves.
    #[error("vocabulary has {0} distinct word(s); at least 2 are needed")]
    DegenerateVocabulary(usize),

    #[error("invalid training parameter: {0}")]
    InvalidParameter(String),

    #[error("word {0:?} is not in the vocabulary")]
    UnknownWord(String),

    #[error("vector has {found} components, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Huffman code for {word:?} is longer than {max} bits", max = MAX_CODE_LENGTH)]
    CodeTooLong { word: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
