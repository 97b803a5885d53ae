//! Progress through the corpus and the learning-rate schedule of one training run.

use crate::corpus::{Corpus, Sentence};
use crate::parameter::TrainingParameters;

/// The learning rate is recomputed once this many words have gone by.
const ALPHA_UPDATE_INTERVAL: u64 = 10_000;

/// The learning rate never drops below this fraction of the starting rate.
const MIN_ALPHA_FRACTION: f32 = 0.0001;

/// Training cursor: which sentence and word come next, how many epochs are
/// done, and the current learning rate.
///
/// Holds the corpus for the length of the run so that it can reshuffle the
/// sentences at every epoch boundary.
#[derive(Debug)]
pub struct Iteration<'a> {
    corpus: &'a mut Corpus,
    /// Number of epochs to run.
    iterations: usize,
    seed: u64,
    /// Words in the corpus; the schedule runs from 0 to `iterations * train_words`.
    train_words: u64,
    /// Words in the finished sentences of the current epoch.
    word_count: u64,
    /// `word_count` at the last learning-rate update.
    last_word_count: u64,
    /// Words processed over the whole run, as of the last learning-rate update.
    word_count_actual: u64,
    iteration_count: usize,
    sentence_index: usize,
    sentence_position: usize,
    starting_alpha: f32,
    alpha: f32,
}

impl<'a> Iteration<'a> {
    /// Starts a run at the first word of the first sentence.
    ///
    /// `corpus` must have at least one sentence.
    pub fn new(corpus: &'a mut Corpus, parameter: &TrainingParameters) -> Self {
        let train_words = corpus.number_of_words();
        Iteration {
            corpus,
            iterations: parameter.iterations,
            seed: parameter.seed,
            train_words,
            word_count: 0,
            last_word_count: 0,
            word_count_actual: 0,
            iteration_count: 0,
            sentence_index: 0,
            sentence_position: 0,
            starting_alpha: parameter.alpha,
            alpha: parameter.alpha,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Number of finished epochs.
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    pub fn sentence_index(&self) -> usize {
        self.sentence_index
    }

    pub fn sentence_position(&self) -> usize {
        self.sentence_position
    }

    pub fn word_count_actual(&self) -> u64 {
        self.word_count_actual
    }

    pub fn is_done(&self) -> bool {
        self.iteration_count >= self.iterations
    }

    /// The sentence containing the current word.
    pub fn sentence(&self) -> &Sentence {
        self.corpus.sentence(self.sentence_index)
    }

    /// Decays the learning rate linearly over the whole run, refreshing it
    /// only after every `ALPHA_UPDATE_INTERVAL` words.
    pub fn alpha_update(&mut self) {
        if self.word_count - self.last_word_count > ALPHA_UPDATE_INTERVAL {
            self.word_count_actual += self.word_count - self.last_word_count;
            self.last_word_count = self.word_count;
            let total = (self.iterations as u64 * self.train_words + 1) as f32;
            self.alpha = (self.starting_alpha * (1.0 - self.word_count_actual as f32 / total))
                .max(self.starting_alpha * MIN_ALPHA_FRACTION);
        }
    }

    /// Moves to the next word and returns the sentence it is in.
    ///
    /// Past the end of the last sentence, the epoch count goes up, the
    /// per-epoch counters reset, and the corpus is reshuffled before starting
    /// over at its (new) first sentence.
    pub fn sentence_update(&mut self) -> &Sentence {
        self.sentence_position += 1;
        let current_length = self.corpus.sentence(self.sentence_index).word_count();
        if self.sentence_position >= current_length {
            self.word_count += current_length as u64;
            self.sentence_index += 1;
            self.sentence_position = 0;
            if self.sentence_index == self.corpus.sentence_count() {
                self.iteration_count += 1;
                self.word_count = 0;
                self.last_word_count = 0;
                self.sentence_index = 0;
                self.corpus.shuffle_sentences(self.seed);
            }
        }
        self.sentence()
    }
}
