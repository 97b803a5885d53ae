//! Word2Vec word embeddings: continuous bag of words or skip-gram, trained
//! with hierarchical softmax or negative sampling.

pub mod comparator;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod iteration;
pub mod network;
pub mod parameter;
pub mod semantic;
pub mod vocabulary;

pub use comparator::WordComparator;
pub use corpus::{Corpus, Sentence};
pub use dictionary::{VectorFormat, VectorizedDictionary, VectorizedWord};
pub use error::{Error, Result};
pub use iteration::Iteration;
pub use network::NeuralNetwork;
pub use parameter::{Algorithm, LossFunction, TrainingParameters};
pub use semantic::{SemanticDataSet, WordPair};
pub use vocabulary::{Vocabulary, VocabularyWord, MAX_CODE_LENGTH};
