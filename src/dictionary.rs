//! Trained word vectors, kept in name order for lookup.

use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context};
use ndarray::{Array1, ArrayView1};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::comparator::WordComparator;
use crate::error::{Error, Result};

pub fn norm(v: ArrayView1<'_, f32>) -> f32 {
    v.dot(&v).sqrt()
}

/// Scales `v` to length 1. Leaves a zero vector alone.
pub fn normalize(v: &mut Array1<f32>) {
    let len = norm(v.view());
    if len != 0.0 {
        *v /= len;
    }
}

/// Cosine of the angle between `a` and `b`; 0 if either is the zero vector.
///
/// Panics if the lengths differ.
pub fn cosine_similarity(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    assert_eq!(a.len(), b.len());
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        a.dot(&b) / denominator
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizedWord {
    name: String,
    vector: Array1<f32>,
}

impl VectorizedWord {
    pub fn new(name: impl Into<String>, vector: Array1<f32>) -> Self {
        VectorizedWord {
            name: name.into(),
            vector,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vector(&self) -> ArrayView1<'_, f32> {
        self.vector.view()
    }
}

/// On-disk layouts for a dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum VectorFormat {
    /// Header line `words size`, then `word v1 v2 ...` per line.
    #[default]
    Text,
    /// Header line `words size`, then `word ` followed by the raw f32s of the
    /// vector and a newline.
    Binary,
    /// The whole dictionary in bincode.
    Bincode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizedDictionary {
    comparator: WordComparator,
    /// Sorted by `comparator`, unique by name.
    words: Vec<VectorizedWord>,
}

impl VectorizedDictionary {
    pub fn new(comparator: WordComparator) -> Self {
        VectorizedDictionary {
            comparator,
            words: Vec::new(),
        }
    }

    fn from_words(comparator: WordComparator, mut words: Vec<VectorizedWord>) -> Self {
        words.sort_by(|a, b| comparator.compare(&a.name, &b.name));
        words.dedup_by(|later, earlier| later.name == earlier.name);
        VectorizedDictionary { comparator, words }
    }

    pub fn comparator(&self) -> WordComparator {
        self.comparator
    }

    /// Adds `word`, replacing any entry with the same name. Every vector in a
    /// dictionary has the same length.
    pub fn add_word(&mut self, word: VectorizedWord) -> Result<()> {
        self.check_dimension(word.vector.len())?;
        match self.search(&word.name) {
            Ok(i) => self.words[i] = word,
            Err(i) => self.words.insert(i, word),
        }
        Ok(())
    }

    fn check_dimension(&self, found: usize) -> Result<()> {
        match self.words.first() {
            Some(w) if w.vector.len() != found => Err(Error::DimensionMismatch {
                expected: w.vector.len(),
                found,
            }),
            _ => Ok(()),
        }
    }

    fn search(&self, name: &str) -> std::result::Result<usize, usize> {
        self.words
            .binary_search_by(|w| self.comparator.compare(&w.name, name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.search(name).ok()
    }

    pub fn get_word(&self, name: &str) -> Option<&VectorizedWord> {
        self.position(name).map(|i| &self.words[i])
    }

    /// Panics if `index` is out of range.
    pub fn word(&self, index: usize) -> &VectorizedWord {
        &self.words[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &VectorizedWord> + '_ {
        self.words.iter()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Vector length, or 0 for an empty dictionary.
    pub fn dimension(&self) -> usize {
        self.words.first().map_or(0, |w| w.vector.len())
    }

    /// The `n` words closest to `vector` by cosine similarity, best first,
    /// skipping the word indices in `exclude`.
    pub fn most_similar(
        &self,
        vector: ArrayView1<'_, f32>,
        exclude: &[usize],
        n: usize,
    ) -> Result<Vec<(&str, f32)>> {
        self.check_dimension(vector.len())?;
        let mut best: Vec<(&str, f32)> = self
            .words
            .iter()
            .enumerate()
            .filter(|(c, _)| !exclude.contains(c))
            .map(|(_, w)| (w.name.as_str(), cosine_similarity(vector, w.vector.view())))
            .collect();
        best.sort_by_key(|(_word, dist)| Reverse(OrderedFloat(*dist)));
        best.truncate(n);
        Ok(best)
    }

    /// Answers "`a` is to `b` as `c` is to ?" with the `n` best candidates.
    pub fn analogy(&self, a: &str, b: &str, c: &str, n: usize) -> Result<Vec<(&str, f32)>> {
        let mut bi = Vec::with_capacity(3);
        for word in [a, b, c] {
            bi.push(
                self.position(word)
                    .ok_or_else(|| Error::UnknownWord(word.to_string()))?,
            );
        }
        let mut vec = &self.words[bi[1]].vector - &self.words[bi[0]].vector
            + &self.words[bi[2]].vector;
        normalize(&mut vec);
        self.most_similar(vec.view(), &bi, n)
    }

    pub fn save(&self, file_name: &Path, format: VectorFormat) -> anyhow::Result<()> {
        let mut fo =
            BufWriter::new(File::create(file_name).context("error creating output file")?);
        match format {
            VectorFormat::Bincode => {
                bincode::serialize_into(&mut fo, self).context("error writing output file")?;
            }
            VectorFormat::Text | VectorFormat::Binary => {
                writeln!(fo, "{} {}", self.len(), self.dimension())
                    .context("error writing output file")?;
                for word in &self.words {
                    write!(fo, "{}", word.name).context("error writing output file")?;
                    if format == VectorFormat::Binary {
                        write!(fo, " ").context("error writing output file")?;
                        let word_vec = word.vector.to_vec();
                        fo.write_all(bytemuck::cast_slice::<f32, u8>(&word_vec))
                            .context("error writing output file")?;
                    } else {
                        for f in &word.vector {
                            write!(fo, " {f}").context("error writing output file")?;
                        }
                    }
                    writeln!(fo).context("error writing output file")?;
                }
            }
        }
        fo.flush().context("error writing output file")?;
        Ok(())
    }

    /// Reads a dictionary written by `save`, or by any tool that uses the
    /// word2vec text or binary layout.
    pub fn load(
        file_name: &Path,
        format: VectorFormat,
        comparator: WordComparator,
    ) -> anyhow::Result<Self> {
        let mut f = BufReader::new(
            File::open(file_name)
                .with_context(|| format!("error opening input file {file_name:?}"))?,
        );
        if format == VectorFormat::Bincode {
            let dictionary: VectorizedDictionary =
                bincode::deserialize_from(f).context("error reading input file")?;
            if let Some(first) = dictionary.words.first() {
                let size = first.vector.len();
                for word in &dictionary.words {
                    anyhow::ensure!(
                        word.vector.len() == size,
                        "word {:?} has {} components, expected {size}",
                        word.name,
                        word.vector.len()
                    );
                }
            }
            return Ok(if dictionary.comparator == comparator {
                dictionary
            } else {
                VectorizedDictionary::from_words(comparator, dictionary.words)
            });
        }

        let mut line = String::new();
        f.read_line(&mut line).context("error reading input file")?;
        let mut fields = line.split_whitespace();
        let num_words: usize = fields
            .next()
            .ok_or_else(|| anyhow!("invalid input file"))?
            .parse()
            .context("invalid input file")?;
        let size: usize = fields
            .next()
            .ok_or_else(|| anyhow!("invalid input file"))?
            .parse()
            .context("invalid input file")?;

        let mut words = Vec::with_capacity(num_words);
        for b in 0..num_words {
            let word = if format == VectorFormat::Binary {
                read_binary_word(&mut f, size)?
            } else {
                read_text_word(&mut f, size)?
            };
            match word {
                Some(word) => words.push(word),
                None => anyhow::bail!("input file ends after {b} of {num_words} words"),
            }
        }
        Ok(VectorizedDictionary::from_words(comparator, words))
    }
}

fn read_binary_word(f: &mut impl BufRead, size: usize) -> anyhow::Result<Option<VectorizedWord>> {
    let mut vocab_word = Vec::<u8>::new();
    let count = f
        .read_until(b' ', &mut vocab_word)
        .context("error reading input file")?;
    if count == 0 {
        return Ok(None);
    }
    if vocab_word.last() == Some(&b' ') {
        vocab_word.pop();
    }
    vocab_word.retain(|c| *c != b'\n');
    let name = String::from_utf8(vocab_word).context("invalid word in input file")?;

    let mut row = vec![0.0f32; size];
    f.read_exact(bytemuck::cast_slice_mut::<f32, u8>(&mut row))
        .context("error reading input file")?;
    Ok(Some(VectorizedWord::new(name, Array1::from(row))))
}

fn read_text_word(f: &mut impl BufRead, size: usize) -> anyhow::Result<Option<VectorizedWord>> {
    let mut line = String::new();
    if f.read_line(&mut line).context("error reading input file")? == 0 {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    let name = fields
        .next()
        .ok_or_else(|| anyhow!("invalid input file: empty line"))?;
    let row = fields
        .map(|s| s.parse::<f32>())
        .collect::<std::result::Result<Vec<f32>, _>>()
        .with_context(|| format!("invalid vector for word {name:?}"))?;
    anyhow::ensure!(
        row.len() == size,
        "word {name:?} has {} components, expected {size}",
        row.len()
    );
    Ok(Some(VectorizedWord::new(name, Array1::from(row))))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn sample() -> VectorizedDictionary {
        let mut dictionary = VectorizedDictionary::new(WordComparator::English);
        dictionary.add_word(VectorizedWord::new("man", array![1.0, 0.0, 0.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("woman", array![1.0, 1.0, 0.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("king", array![1.0, 0.0, 1.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("queen", array![1.0, 1.0, 1.0])).unwrap();
        dictionary.add_word(VectorizedWord::new("apple", array![0.0, -1.0, 0.5])).unwrap();
        dictionary
    }

    #[test]
    fn keeps_name_order() {
        let mut dictionary = sample();
        let names: Vec<&str> = dictionary.iter().map(|w| w.name()).collect();
        assert_eq!(names, ["apple", "king", "man", "queen", "woman"]);
        assert_eq!(dictionary.position("man"), Some(2));
        assert_eq!(dictionary.get_word("pear"), None);

        dictionary.add_word(VectorizedWord::new("man", array![2.0, 0.0, 0.0])).unwrap();
        assert_eq!(dictionary.len(), 5);
        assert_eq!(dictionary.get_word("man").unwrap().vector(), array![2.0f32, 0.0, 0.0]);
        assert_eq!(dictionary.dimension(), 3);
    }

    #[test]
    fn cosine() {
        let a = array![1.0f32, 0.0];
        let b = array![0.0f32, 2.0];
        let c = array![3.0f32, 0.0];
        assert_eq!(cosine_similarity(a.view(), b.view()), 0.0);
        assert!((cosine_similarity(a.view(), c.view()) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(a.view(), Array1::zeros(2).view()), 0.0);
    }

    #[test]
    fn nearest_and_analogy() {
        let dictionary = sample();
        let man = dictionary.position("man").unwrap();
        let best = dictionary
            .most_similar(dictionary.word(man).vector(), &[man], 2)
            .unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].0, "woman");

        let answer = dictionary.analogy("man", "woman", "king", 1).unwrap();
        assert_eq!(answer[0].0, "queen");
        assert!(matches!(
            dictionary.analogy("man", "woman", "prince", 1),
            Err(Error::UnknownWord(w)) if w == "prince"
        ));
    }

    #[test]
    fn vectors_share_one_length() {
        let mut dictionary = sample();
        assert!(matches!(
            dictionary.add_word(VectorizedWord::new("pear", array![1.0, 2.0])),
            Err(Error::DimensionMismatch { expected: 3, found: 2 })
        ));
        assert_eq!(dictionary.len(), 5);
        assert_eq!(dictionary.get_word("pear"), None);

        let query = array![1.0f32, 0.0];
        assert!(matches!(
            dictionary.most_similar(query.view(), &[], 3),
            Err(Error::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn save_and_load() {
        let dictionary = sample();
        for format in [VectorFormat::Text, VectorFormat::Binary, VectorFormat::Bincode] {
            let file = tempfile::NamedTempFile::new().unwrap();
            dictionary.save(file.path(), format).unwrap();
            let loaded =
                VectorizedDictionary::load(file.path(), format, WordComparator::English).unwrap();
            assert_eq!(loaded.len(), dictionary.len(), "{format:?}");
            for (a, b) in loaded.iter().zip(dictionary.iter()) {
                assert_eq!(a, b, "{format:?}");
            }
        }
    }

    #[test]
    fn truncated_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "3 2").unwrap();
        writeln!(file, "a 1 2").unwrap();
        writeln!(file, "b 3 4").unwrap();
        let err = VectorizedDictionary::load(file.path(), VectorFormat::Text, WordComparator::English)
            .unwrap_err();
        assert!(err.to_string().contains("ends after 2 of 3"), "{err:#}");
    }
}
