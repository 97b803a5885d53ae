//! Locale-aware ordering of words.
//!
//! Both the vocabulary and the output dictionary keep their words sorted with
//! one of these comparators and look words up by binary search, so the order
//! must be total: two distinct strings never compare equal.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// The Turkish alphabet, with q, w and x slotted in where Turkish collation puts them.
const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum WordComparator {
    /// Case-insensitive alphabetical order; lowercase sorts first among words
    /// that differ only in case.
    #[default]
    English,
    /// Turkish alphabetical order (`ç` after `c`, dotless `ı` before `i`, ...),
    /// with Turkish case folding (`I` -> `ı`, `İ` -> `i`).
    Turkish,
}

impl WordComparator {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        let primary = match self {
            WordComparator::English => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
            WordComparator::Turkish => a
                .chars()
                .map(turkish_key)
                .cmp(b.chars().map(turkish_key)),
        };
        primary
            .then_with(|| {
                a.chars()
                    .map(char::is_uppercase)
                    .cmp(b.chars().map(char::is_uppercase))
            })
            .then_with(|| a.cmp(b))
    }
}

/// Sort key of a single character under Turkish collation.
///
/// Non-letters sort before letters, letters of the Turkish alphabet in
/// alphabet order, other letters after them by code point.
fn turkish_key(c: char) -> (u8, u32) {
    let lower = match c {
        'I' => 'ı',
        'İ' => 'i',
        c => c.to_lowercase().next().unwrap_or(c),
    };
    match TURKISH_ALPHABET.chars().position(|t| t == lower) {
        Some(rank) => (1, rank as u32),
        None if lower.is_alphabetic() => (2, lower as u32),
        None => (0, lower as u32),
    }
}
