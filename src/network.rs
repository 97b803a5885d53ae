//! The training loop: CBOW or Skip-Gram, with hierarchical softmax or
//! negative sampling.

use indicatif::ProgressBar;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::corpus::{Corpus, Sentence};
use crate::dictionary::{VectorizedDictionary, VectorizedWord};
use crate::error::{Error, Result};
use crate::iteration::Iteration;
use crate::parameter::TrainingParameters;
use crate::vocabulary::Vocabulary;

pub const EXP_TABLE_SIZE: usize = 1000;
pub const MAX_EXP: f32 = 6.0;

/// Precomputed logistic function over `[-MAX_EXP, MAX_EXP]`.
#[derive(Debug, Clone)]
pub struct SigmoidTable {
    table: Vec<f32>,
}

impl Default for SigmoidTable {
    fn default() -> Self {
        SigmoidTable::new()
    }
}

impl SigmoidTable {
    pub fn new() -> Self {
        let table = (0..EXP_TABLE_SIZE)
            .map(|i| {
                let e = ((i as f32 / EXP_TABLE_SIZE as f32 * 2.0 - 1.0) * MAX_EXP).exp();
                e / (e + 1.0)
            })
            .collect();
        SigmoidTable { table }
    }

    /// Approximate `1 / (1 + e^-f)` for `f` in `[-MAX_EXP, MAX_EXP]`.
    pub fn lookup(&self, f: f32) -> f32 {
        let i = ((f + MAX_EXP) * (EXP_TABLE_SIZE as f32 / MAX_EXP / 2.0)) as usize;
        self.table[i.min(EXP_TABLE_SIZE - 1)]
    }

    /// Gradient scale `(label - sigmoid(f)) * alpha`. Outside the table the
    /// sigmoid is taken as exactly 0 or 1.
    pub fn gradient(&self, f: f32, alpha: f32, label: f32) -> f32 {
        if f > MAX_EXP {
            (label - 1.0) * alpha
        } else if f < -MAX_EXP {
            label * alpha
        } else {
            (label - self.lookup(f)) * alpha
        }
    }
}

/// One training run over a corpus.
#[derive(Debug)]
pub struct NeuralNetwork {
    corpus: Corpus,
    parameter: TrainingParameters,
    vocabulary: Vocabulary,
    /// One row per vocabulary word: the embeddings being learned.
    word_vectors: Array2<f32>,
    /// Internal-node weights for hierarchical softmax, or output-word weights
    /// for negative sampling.
    context_vectors: Array2<f32>,
    sigmoid: SigmoidTable,
    rng: StdRng,
}

impl NeuralNetwork {
    pub fn new(corpus: Corpus, parameter: TrainingParameters) -> Result<Self> {
        parameter.validate()?;
        if corpus.sentence_count() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let vocabulary = Vocabulary::new(&corpus, parameter.comparator)?;

        let mut rng = StdRng::seed_from_u64(parameter.seed);
        let shape = (vocabulary.size(), parameter.layer_size);
        let word_vectors =
            Array2::random_using(shape, Uniform::new_inclusive(-0.5f32, 0.5f32), &mut rng);
        let context_vectors = Array2::zeros(shape);

        Ok(NeuralNetwork {
            corpus,
            parameter,
            vocabulary,
            word_vectors,
            context_vectors,
            sigmoid: SigmoidTable::new(),
            rng,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.size()
    }

    pub fn train(self) -> Result<VectorizedDictionary> {
        self.train_with_progress(&ProgressBar::hidden())
    }

    /// Like `train`, reporting progress in words processed over all epochs.
    pub fn train_with_progress(mut self, progress: &ProgressBar) -> Result<VectorizedDictionary> {
        let corpus_words = self.corpus.number_of_words();
        let total_words = self.parameter.iterations as u64 * corpus_words;
        progress.set_length(total_words);

        let mut trainer = Trainer {
            vocabulary: &self.vocabulary,
            parameter: &self.parameter,
            word_vectors: &mut self.word_vectors,
            context_vectors: &mut self.context_vectors,
            sigmoid: &self.sigmoid,
            rng: &mut self.rng,
            input: Array1::zeros(self.parameter.layer_size),
            update: Array1::zeros(self.parameter.layer_size),
            context: Vec::with_capacity(2 * self.parameter.window),
        };

        let mut iteration = Iteration::new(&mut self.corpus, &self.parameter);
        let mut last_alpha = iteration.alpha();
        while !iteration.is_done() {
            iteration.alpha_update();
            if iteration.alpha() != last_alpha {
                last_alpha = iteration.alpha();
                let percent =
                    iteration.word_count_actual() as f64 / (total_words + 1) as f64 * 100.0;
                debug!(
                    alpha = last_alpha,
                    progress = %format!("{percent:.2}%"),
                    "learning rate updated"
                );
                progress.set_position(iteration.word_count_actual());
            }

            trainer.step(
                iteration.sentence(),
                iteration.sentence_position(),
                iteration.alpha(),
            )?;

            let epoch = iteration.iteration_count();
            iteration.sentence_update();
            if iteration.iteration_count() != epoch {
                let finished = iteration.iteration_count();
                info!(epoch = finished, alpha = iteration.alpha(), "finished epoch");
                progress.set_position(finished as u64 * corpus_words);
            }
        }
        progress.finish();

        let mut dictionary = VectorizedDictionary::new(self.parameter.comparator);
        for (i, word) in self.vocabulary.iter().enumerate() {
            dictionary.add_word(VectorizedWord::new(
                word.name(),
                self.word_vectors.row(i).to_owned(),
            ))?;
        }
        Ok(dictionary)
    }
}

/// Borrows the network's matrices for the length of a run, plus scratch
/// buffers reused across steps.
struct Trainer<'a> {
    vocabulary: &'a Vocabulary,
    parameter: &'a TrainingParameters,
    word_vectors: &'a mut Array2<f32>,
    context_vectors: &'a mut Array2<f32>,
    sigmoid: &'a SigmoidTable,
    rng: &'a mut StdRng,
    /// Hidden layer for the current prediction.
    input: Array1<f32>,
    /// Gradient pending for the input rows.
    update: Array1<f32>,
    /// Vocabulary indices of the words in the current window.
    context: Vec<usize>,
}

impl Trainer<'_> {
    /// One gradient step for the word at `position` in `sentence`.
    fn step(&mut self, sentence: &Sentence, position: usize, alpha: f32) -> Result<()> {
        let word = self.vocabulary.index_of(sentence.word(position))?;
        self.collect_context(sentence, position)?;
        if self.parameter.is_cbow() {
            self.cbow(word, alpha);
        } else {
            self.skip_gram(word, alpha);
        }
        Ok(())
    }

    /// Fills `context` with the words around `position`, within a window
    /// shrunk by a random amount.
    fn collect_context(&mut self, sentence: &Sentence, position: usize) -> Result<()> {
        let window = self.parameter.window;
        let b = self.rng.gen_range(0..window);
        self.context.clear();
        for a in b..(window * 2 + 1 - b) {
            if a == window {
                continue;
            }
            let c = match (position + a).checked_sub(window) {
                Some(c) if c < sentence.word_count() => c,
                _ => continue,
            };
            self.context.push(self.vocabulary.index_of(sentence.word(c))?);
        }
        Ok(())
    }

    fn cbow(&mut self, word: usize, alpha: f32) {
        if self.context.is_empty() {
            return;
        }
        self.input.fill(0.0);
        self.update.fill(0.0);
        for &c in &self.context {
            self.input += &self.word_vectors.row(c);
        }
        self.input /= self.context.len() as f32;
        self.learn(word, alpha);
        for &c in &self.context {
            self.word_vectors.row_mut(c).scaled_add(1.0, &self.update);
        }
    }

    fn skip_gram(&mut self, word: usize, alpha: f32) {
        for i in 0..self.context.len() {
            let c = self.context[i];
            self.input.assign(&self.word_vectors.row(c));
            self.update.fill(0.0);
            self.learn(word, alpha);
            self.word_vectors.row_mut(c).scaled_add(1.0, &self.update);
        }
    }

    /// Predicts `word` from `input`: updates the context rows and
    /// accumulates the gradient for the input rows in `update`.
    fn learn(&mut self, word: usize, alpha: f32) {
        if self.parameter.is_hierarchical_softmax() {
            let vocab_word = self.vocabulary.word(word);
            for (&point, &code) in vocab_word.point().iter().zip(vocab_word.code()) {
                let mut row = self.context_vectors.row_mut(point as usize);
                let f = self.input.dot(&row);
                if f <= -MAX_EXP || f >= MAX_EXP {
                    continue;
                }
                let g = (1.0 - code as f32 - self.sigmoid.lookup(f)) * alpha;
                self.update.scaled_add(g, &row);
                row.scaled_add(g, &self.input);
            }
        } else {
            self.apply(word, 1.0, alpha);
            for _ in 0..self.parameter.negative {
                if let Some(target) = self.draw_negative(word) {
                    self.apply(target, 0.0, alpha);
                }
            }
        }
    }

    fn apply(&mut self, target: usize, label: f32, alpha: f32) {
        let mut row = self.context_vectors.row_mut(target);
        let f = self.input.dot(&row);
        let g = self.sigmoid.gradient(f, alpha, label);
        self.update.scaled_add(g, &row);
        row.scaled_add(g, &self.input);
    }

    /// Draws a negative example from the unigram table. A draw that hits
    /// `word` itself is dropped and uses up its slot.
    fn draw_negative(&mut self, word: usize) -> Option<usize> {
        let mut target = self
            .vocabulary
            .table_value(self.rng.gen_range(0..self.vocabulary.table_size()));
        if target == 0 {
            target = self.rng.gen_range(1..self.vocabulary.size());
        }
        (target != word).then_some(target)
    }
}
