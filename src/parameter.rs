use serde::{Deserialize, Serialize};

use crate::comparator::WordComparator;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Continuous bag of words: predict a word from the average of its context.
    #[default]
    Cbow,
    /// Predict each context word from the word itself.
    SkipGram,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossFunction {
    /// Walk the word's Huffman code, one binary classifier per internal node.
    HierarchicalSoftmax,
    /// Contrast the word against a few words drawn from the unigram table.
    #[default]
    NegativeSampling,
}

/// Settings for one training run. Fixed once training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParameters {
    /// Embedding vector length (number of dimensions).
    pub layer_size: usize,
    pub algorithm: Algorithm,
    /// Starting learning rate.
    pub alpha: f32,
    /// Max skip length between words.
    pub window: usize,
    pub loss: LossFunction,
    /// Number of negative examples per word. Ignored for hierarchical softmax.
    pub negative: usize,
    /// Number of passes (epochs) over the corpus.
    pub iterations: usize,
    /// Seeds every random draw of the run, including the per-epoch reshuffle.
    pub seed: u64,
    /// Order of the vocabulary and of the resulting dictionary.
    pub comparator: WordComparator,
}

impl Default for TrainingParameters {
    fn default() -> Self {
        TrainingParameters {
            layer_size: 100,
            algorithm: Algorithm::Cbow,
            alpha: 0.025,
            window: 5,
            loss: LossFunction::NegativeSampling,
            negative: 5,
            iterations: 3,
            seed: 1,
            comparator: WordComparator::English,
        }
    }
}

impl TrainingParameters {
    pub fn is_cbow(&self) -> bool {
        self.algorithm == Algorithm::Cbow
    }

    pub fn is_hierarchical_softmax(&self) -> bool {
        self.loss == LossFunction::HierarchicalSoftmax
    }

    pub fn validate(&self) -> Result<()> {
        if self.layer_size == 0 {
            return Err(Error::InvalidParameter("layer size must be at least 1".into()));
        }
        if self.window == 0 {
            return Err(Error::InvalidParameter("window must be at least 1".into()));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidParameter("number of iterations must be at least 1".into()));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let parameter = TrainingParameters::default();
        assert!(parameter.validate().is_ok());
        assert!(parameter.is_cbow());
        assert!(!parameter.is_hierarchical_softmax());
        assert_eq!(parameter.layer_size, 100);
        assert_eq!(parameter.negative, 5);
    }

    #[test]
    fn rejects_degenerate_settings() {
        let bad = [
            TrainingParameters { window: 0, ..Default::default() },
            TrainingParameters { layer_size: 0, ..Default::default() },
            TrainingParameters { iterations: 0, ..Default::default() },
            TrainingParameters { alpha: 0.0, ..Default::default() },
            TrainingParameters { alpha: f32::NAN, ..Default::default() },
        ];
        for parameter in bad {
            assert!(
                matches!(parameter.validate(), Err(Error::InvalidParameter(_))),
                "{parameter:?} should be rejected"
            );
        }
    }
}
