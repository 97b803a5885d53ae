use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::comparator::WordComparator;
use crate::corpus::Corpus;
use crate::error::{Error, Result};

/// Longest Huffman code a word may get.
pub const MAX_CODE_LENGTH: usize = 40;

/// Count given to internal nodes before they are created, larger than any real count.
const UNMERGED: u64 = 1_000_000_000_000_000;

/// One distinct word of the corpus with its Huffman code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyWord {
    name: String,
    count: u64,
    /// `code[d]` is 1 if the path from the root turns to the second child at depth `d`.
    code: Vec<u8>,
    /// `point[d]` is the internal node visited at depth `d`; `point[0]` is the root.
    point: Vec<u32>,
}

impl VocabularyWord {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        VocabularyWord {
            name: name.into(),
            count,
            code: Vec::new(),
            point: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn point(&self) -> &[u32] {
        &self.point
    }

    pub fn code_length(&self) -> usize {
        self.code.len()
    }
}

/// The words of a corpus, sorted by `WordComparator` for lookup, with Huffman
/// codes and a unigram table for negative sampling.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<VocabularyWord>,
    /// Word indices, each appearing in proportion to `count^0.75`.
    table: Vec<usize>,
    comparator: WordComparator,
}

impl Vocabulary {
    pub fn new(corpus: &Corpus, comparator: WordComparator) -> Result<Self> {
        let mut words: Vec<VocabularyWord> = corpus
            .word_list()
            .map(|word| VocabularyWord::new(word, corpus.count(word)))
            .collect();
        if words.len() < 2 {
            return Err(Error::DegenerateVocabulary(words.len()));
        }

        // Frequency order: both the table and the tree depend on it.
        words.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| comparator.compare(&a.name, &b.name))
        });
        let table = unigram_table(&words);
        create_binary_tree(&mut words)?;

        // Back to name order for lookups. The table holds frequency ranks, so
        // translate them too.
        let mut ranked: Vec<(usize, VocabularyWord)> = words.into_iter().enumerate().collect();
        ranked.sort_by(|(_, a), (_, b)| comparator.compare(&a.name, &b.name));
        let mut name_index = vec![0; ranked.len()];
        for (position, (rank, _)) in ranked.iter().enumerate() {
            name_index[*rank] = position;
        }
        let words: Vec<VocabularyWord> = ranked.into_iter().map(|(_, vw)| vw).collect();
        let table = table.into_iter().map(|rank| name_index[rank]).collect();

        info!(
            vocab_size = words.len(),
            train_words = corpus.number_of_words(),
            "built vocabulary"
        );
        Ok(Vocabulary {
            words,
            table,
            comparator,
        })
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    /// Panics if `index` is out of range.
    pub fn word(&self, index: usize) -> &VocabularyWord {
        &self.words[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyWord> + '_ {
        self.words.iter()
    }

    pub fn comparator(&self) -> WordComparator {
        self.comparator
    }

    /// Binary search by name: `Ok(index)` if present, else `Err(insertion point)`.
    pub fn search(&self, word: &str) -> std::result::Result<usize, usize> {
        self.words
            .binary_search_by(|vw| self.comparator.compare(&vw.name, word))
    }

    /// Index of `word`, or minus the index where it would be inserted if absent.
    pub fn position(&self, word: &str) -> isize {
        match self.search(word) {
            Ok(i) => i as isize,
            Err(i) => -(i as isize),
        }
    }

    pub fn index_of(&self, word: &str) -> Result<usize> {
        self.search(word)
            .map_err(|_| Error::UnknownWord(word.to_string()))
    }

    pub fn table_value(&self, index: usize) -> usize {
        self.table[index]
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Writes one `word count` line per word, in vocabulary order.
    pub fn save(&self, vocab_file: &Path) -> anyhow::Result<()> {
        let mut fo = BufWriter::new(
            File::create(vocab_file).context("error creating vocab file for write")?,
        );
        for vw in &self.words {
            writeln!(fo, "{} {}", vw.name, vw.count).context("error writing vocab file")?;
        }
        fo.flush().context("error writing vocab file")?;
        Ok(())
    }
}

/// Builds the negative-sampling table from words sorted by descending count.
///
/// The table has two slots per word; word `i` fills a run of slots whose
/// length is proportional to `count^0.75`.
fn unigram_table(words: &[VocabularyWord]) -> Vec<usize> {
    let power: f64 = 0.75;
    let table_size = 2 * words.len();
    let train_words_pow = words
        .iter()
        .map(|vw| (vw.count as f64).powf(power))
        .sum::<f64>();

    let mut table = Vec::with_capacity(table_size);
    let mut i = 0;
    let mut d1 = (words[i].count as f64).powf(power) / train_words_pow;
    for a in 0..table_size {
        table.push(i);
        // Stopping at the last word fills the same slots as advancing past
        // it and clamping back.
        if a as f64 / table_size as f64 > d1 && i + 1 < words.len() {
            i += 1;
            d1 += (words[i].count as f64).powf(power) / train_words_pow;
        }
    }
    table
}

// Create binary Huffman tree using the word counts.
// Frequent words will have short unique binary codes.
//
// `words` must be sorted by descending count. Then the unmerged leaves, read
// from the end, and the internal nodes, in creation order, are both
// non-decreasing, so the two smallest nodes are always at one of two cursors.
#[allow(clippy::needless_range_loop)]
fn create_binary_tree(words: &mut [VocabularyWord]) -> Result<()> {
    let vocab_size = words.len();
    let mut count = vec![0u64; vocab_size * 2 + 1];
    let mut binary = vec![0u8; vocab_size * 2 + 1]; // which child a node is of its parent (0 or 1)
    let mut parent_node = vec![0usize; vocab_size * 2 + 1];

    for a in 0..vocab_size {
        count[a] = words[a].count;
    }
    for a in vocab_size..(vocab_size * 2) {
        count[a] = UNMERGED;
    }

    let mut pos1 = vocab_size;
    let mut pos2 = vocab_size;
    for a in 0..(vocab_size - 1) {
        let mut smallest = || {
            if pos1 > 0 && count[pos1 - 1] < count[pos2] {
                pos1 -= 1;
                pos1
            } else {
                pos2 += 1;
                pos2 - 1
            }
        };
        let min1i = smallest();
        let min2i = smallest();

        count[vocab_size + a] = count[min1i] + count[min2i];
        parent_node[min1i] = vocab_size + a;
        parent_node[min2i] = vocab_size + a;
        binary[min2i] = 1;
    }

    // Walk from each leaf up to the root, then reverse.
    let root = vocab_size * 2 - 2;
    for a in 0..vocab_size {
        let mut code: Vec<u8> = vec![];
        let mut point: Vec<u32> = vec![];
        let mut b = a;
        loop {
            if !code.is_empty() {
                point.push((b - vocab_size) as u32);
            }
            code.push(binary[b]);
            b = parent_node[b];
            if b == root {
                break;
            }
        }
        if code.len() > MAX_CODE_LENGTH {
            return Err(Error::CodeTooLong {
                word: words[a].name.clone(),
            });
        }
        code.reverse();
        point.push((vocab_size - 2) as u32);
        point.reverse();
        words[a].code = code;
        words[a].point = point;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Sentence;

    fn corpus(counts: &[(&str, usize)]) -> Corpus {
        let words = counts
            .iter()
            .flat_map(|&(word, n)| std::iter::repeat(word.to_string()).take(n))
            .collect();
        let mut corpus = Corpus::new();
        corpus.add_sentence(Sentence::new(words));
        corpus
    }

    #[test]
    fn sorted_by_name() {
        let corpus = corpus(&[("delta", 1), ("alpha", 4), ("charlie", 2), ("bravo", 9)]);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        let names: Vec<&str> = vocabulary.iter().map(|vw| vw.name()).collect();
        assert_eq!(names, ["alpha", "bravo", "charlie", "delta"]);
        assert_eq!(vocabulary.word(1).count(), 9);
    }

    #[test]
    fn position_sign_convention() {
        let corpus = corpus(&[("b", 1), ("d", 1), ("f", 1)]);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        assert_eq!(vocabulary.position("b"), 0);
        assert_eq!(vocabulary.position("d"), 1);
        assert_eq!(vocabulary.position("f"), 2);
        assert_eq!(vocabulary.position("a"), 0);
        assert_eq!(vocabulary.position("c"), -1);
        assert_eq!(vocabulary.position("e"), -2);
        assert_eq!(vocabulary.position("g"), -3);
        assert_eq!(vocabulary.search("c"), Err(1));
        assert!(matches!(vocabulary.index_of("c"), Err(Error::UnknownWord(w)) if w == "c"));
    }

    #[test]
    fn needs_two_words() {
        let corpus = corpus(&[("only", 3)]);
        assert!(matches!(
            Vocabulary::new(&corpus, WordComparator::English),
            Err(Error::DegenerateVocabulary(1))
        ));
        assert!(matches!(
            Vocabulary::new(&Corpus::new(), WordComparator::English),
            Err(Error::DegenerateVocabulary(0))
        ));
    }

    #[test]
    fn two_word_tree() {
        let corpus = corpus(&[("x", 3), ("y", 1)]);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        for vw in vocabulary.iter() {
            assert_eq!(vw.code_length(), 1);
            assert_eq!(vw.point(), [0u32]);
        }
        assert_ne!(vocabulary.word(0).code(), vocabulary.word(1).code());
    }

    #[test]
    fn huffman_codes() {
        let counts = [("a", 45), ("b", 13), ("c", 12), ("d", 16), ("e", 9), ("f", 5)];
        let corpus = corpus(&counts);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        let n = vocabulary.size();

        // The textbook example: a=1 bit, b/c/d=3 bits, e/f=4 bits.
        let length = |w: &str| vocabulary.word(vocabulary.index_of(w).unwrap()).code_length();
        assert_eq!(length("a"), 1);
        assert_eq!(length("b"), 3);
        assert_eq!(length("c"), 3);
        assert_eq!(length("d"), 3);
        assert_eq!(length("e"), 4);
        assert_eq!(length("f"), 4);

        for vw in vocabulary.iter() {
            assert_eq!(vw.point().len(), vw.code_length());
            assert_eq!(vw.point()[0] as usize, n - 2);
            assert!(vw.point().iter().all(|&p| (p as usize) < n - 1));
        }

        // prefix-free
        for a in vocabulary.iter() {
            for b in vocabulary.iter() {
                if a.name() != b.name() {
                    assert!(!b.code().starts_with(a.code()), "{} prefixes {}", a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn table_is_in_name_order() {
        let corpus = corpus(&[("zebra", 100), ("ant", 1), ("moose", 1)]);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        assert_eq!(vocabulary.table_size(), 6);
        let zebra = vocabulary.index_of("zebra").unwrap();
        assert_eq!(zebra, 2);
        let hits = (0..vocabulary.table_size())
            .filter(|&i| vocabulary.table_value(i) == zebra)
            .count();
        assert!(hits >= 4, "zebra only got {hits} slots");
        assert!((0..vocabulary.table_size()).all(|i| vocabulary.table_value(i) < 3));
    }

    #[test]
    fn save_vocab() {
        let corpus = corpus(&[("b", 2), ("a", 1)]);
        let vocabulary = Vocabulary::new(&corpus, WordComparator::English).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        vocabulary.save(file.path()).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text, "a 1\nb 2\n");
    }
}
