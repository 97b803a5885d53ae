//! Word-similarity benchmarks: human-scored word pairs, and how well a set of
//! trained vectors ranks them.

use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context};
use ordered_float::OrderedFloat;

use crate::dictionary::{cosine_similarity, VectorizedDictionary};

/// Two words and a similarity score. Equality ignores the score.
#[derive(Debug, Clone)]
pub struct WordPair {
    word1: String,
    word2: String,
    related_by: f64,
}

impl WordPair {
    pub fn new(word1: impl Into<String>, word2: impl Into<String>, related_by: f64) -> Self {
        WordPair {
            word1: word1.into(),
            word2: word2.into(),
            related_by,
        }
    }

    pub fn word1(&self) -> &str {
        &self.word1
    }

    pub fn word2(&self) -> &str {
        &self.word2
    }

    pub fn related_by(&self) -> f64 {
        self.related_by
    }

    pub fn set_related_by(&mut self, related_by: f64) {
        self.related_by = related_by;
    }
}

impl PartialEq for WordPair {
    fn eq(&self, other: &Self) -> bool {
        self.word1 == other.word1 && self.word2 == other.word2
    }
}

impl Eq for WordPair {}

#[derive(Debug, Clone, Default)]
pub struct SemanticDataSet {
    pairs: Vec<WordPair>,
}

impl SemanticDataSet {
    pub fn new() -> Self {
        SemanticDataSet::default()
    }

    /// Reads `word1 word2 score` lines. Blank lines are skipped.
    pub fn load(file_name: &Path) -> anyhow::Result<Self> {
        let f = BufReader::new(
            File::open(file_name)
                .with_context(|| format!("error opening data set {file_name:?}"))?,
        );
        let mut data_set = SemanticDataSet::new();
        for (n, line) in f.lines().enumerate() {
            let line = line.context("error reading data set")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields[..] {
                [] => continue,
                [word1, word2, score] => {
                    let score: f64 = score.parse().with_context(|| {
                        format!("{file_name:?} line {}: invalid score {score:?}", n + 1)
                    })?;
                    data_set.add(WordPair::new(word1, word2, score));
                }
                _ => {
                    return Err(anyhow!(
                        "{file_name:?} line {}: expected `word1 word2 score`",
                        n + 1
                    ))
                }
            }
        }
        Ok(data_set)
    }

    pub fn add(&mut self, pair: WordPair) {
        self.pairs.push(pair);
    }

    pub fn size(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[WordPair] {
        &self.pairs
    }

    /// Scores every pair by the cosine similarity of its two vectors.
    ///
    /// Pairs with a word missing from `dictionary` are removed from `self`
    /// too, so that the two data sets line up.
    pub fn calculate_similarities(&mut self, dictionary: &VectorizedDictionary) -> SemanticDataSet {
        let mut result = SemanticDataSet::new();
        self.pairs.retain(|pair| {
            match (dictionary.get_word(&pair.word1), dictionary.get_word(&pair.word2)) {
                (Some(v1), Some(v2)) => {
                    let similarity = cosine_similarity(v1.vector(), v2.vector());
                    result.add(WordPair::new(
                        pair.word1.clone(),
                        pair.word2.clone(),
                        similarity as f64,
                    ));
                    true
                }
                _ => false,
            }
        });
        result
    }

    pub fn index(&self, pair: &WordPair) -> Option<usize> {
        self.pairs.iter().position(|p| p == pair)
    }

    /// Pairs from highest to lowest score. Ties keep their file order.
    fn ranking(&self) -> Vec<&WordPair> {
        let mut ranking: Vec<&WordPair> = self.pairs.iter().collect();
        ranking.sort_by_key(|pair| Reverse(OrderedFloat(pair.related_by)));
        ranking
    }

    /// Spearman's rank correlation between the scores here and in `other`.
    ///
    /// A pair missing from `other` gets rank 0 there. Undefined (NaN) for
    /// fewer than two pairs.
    pub fn spearman_correlation(&self, other: &SemanticDataSet) -> f64 {
        let ours = self.ranking();
        let theirs = other.ranking();
        let sum: f64 = ours
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let rank1 = (i + 1) as f64;
                let rank2 = theirs
                    .iter()
                    .position(|p| p == pair)
                    .map_or(0.0, |j| (j + 1) as f64);
                let d = rank1 - rank2;
                6.0 * d * d
            })
            .sum();
        let n = ours.len() as f64;
        1.0 - sum / (n * (n * n - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ndarray::array;

    use super::*;
    use crate::comparator::WordComparator;
    use crate::dictionary::VectorizedWord;

    fn data_set(pairs: &[(&str, &str, f64)]) -> SemanticDataSet {
        let mut data_set = SemanticDataSet::new();
        for &(a, b, s) in pairs {
            data_set.add(WordPair::new(a, b, s));
        }
        data_set
    }

    #[test]
    fn pair_equality_ignores_score() {
        let mut pair = WordPair::new("cat", "dog", 7.5);
        assert_eq!(pair, WordPair::new("cat", "dog", 1.0));
        assert_ne!(pair, WordPair::new("dog", "cat", 7.5));
        pair.set_related_by(2.0);
        assert_eq!(pair.related_by(), 2.0);
    }

    #[test]
    fn spearman_with_itself_is_one() {
        let data_set = data_set(&[
            ("a", "b", 3.0),
            ("c", "d", 9.5),
            ("e", "f", 3.0),
            ("g", "h", 0.5),
        ]);
        assert_eq!(data_set.spearman_correlation(&data_set), 1.0);
    }

    #[test]
    fn spearman_reversed_is_minus_one() {
        let a = data_set(&[("a", "b", 1.0), ("c", "d", 2.0), ("e", "f", 3.0)]);
        let b = data_set(&[("a", "b", 3.0), ("c", "d", 2.0), ("e", "f", 1.0)]);
        assert_eq!(a.spearman_correlation(&b), -1.0);
        assert_eq!(a.index(&WordPair::new("c", "d", 0.0)), Some(1));
        assert_eq!(a.index(&WordPair::new("x", "y", 0.0)), None);
    }

    #[test]
    fn similarities_drop_unknown_pairs() {
        let mut dictionary = VectorizedDictionary::new(WordComparator::English);
        dictionary.add_word(VectorizedWord::new("cat", array![1.0, 0.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("dog", array![1.0, 1.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("car", array![0.0, 1.0])).unwrap();

        let mut human = data_set(&[
            ("cat", "dog", 8.0),
            ("cat", "unicorn", 5.0),
            ("cat", "car", 1.0),
        ]);
        let computed = human.calculate_similarities(&dictionary);
        assert_eq!(human.size(), 2);
        assert_eq!(computed.size(), 2);
        assert_eq!(computed.pairs()[1].word2(), "car");
        assert_eq!(computed.pairs()[1].related_by(), 0.0);
        assert_eq!(human.spearman_correlation(&computed), 1.0);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tiger cat 7.35").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "book paper 7.46").unwrap();
        let data_set = SemanticDataSet::load(file.path()).unwrap();
        assert_eq!(data_set.size(), 2);
        assert_eq!(data_set.pairs()[1].word1(), "book");
        assert_eq!(data_set.pairs()[0].related_by(), 7.35);

        writeln!(file, "broken line").unwrap();
        assert!(SemanticDataSet::load(file.path()).is_err());
    }
}
