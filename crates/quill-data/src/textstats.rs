//! Stylometric count features over segment text.
//!
//! The punctuation table is built once on first use and treated as
//! read-only shared state afterwards; nothing mutates it after
//! construction.

use std::collections::HashSet;
use std::sync::OnceLock;

/// ASCII punctuation plus the typographic marks common in prose.
const EXTRA_PUNCTUATION: &[char] = &[
    '«', '»', '„', '“', '”', '‘', '’', '‚', '–', '—', '…', '¡', '¿', '·',
];

fn punctuation_table() -> &'static HashSet<char> {
    static TABLE: OnceLock<HashSet<char>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashSet<char> = (0u8..=127)
            .map(char::from)
            .filter(char::is_ascii_punctuation)
            .collect();
        table.extend(EXTRA_PUNCTUATION);
        table
    })
}

/// True for characters counted as punctuation.
pub fn is_punctuation(c: char) -> bool {
    punctuation_table().contains(&c)
}

/// True for characters treated as word separators.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace()
}

/// Count-based features of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStats {
    /// Number of words after stripping punctuation
    pub word_count: f64,
    /// Mean word length in non-punctuation, non-separator characters
    pub avg_word_len: f64,
    /// Punctuation characters per character of text
    pub punct_density: f64,
    /// Uppercase letters per letter
    pub upper_ratio: f64,
}

/// Compute the stylometric counts of one segment.
pub fn segment_stats(text: &str) -> SegmentStats {
    let mut punct = 0usize;
    let mut letters = 0usize;
    let mut upper = 0usize;
    let mut word_chars = 0usize;
    let mut words = 0usize;
    let mut in_word = false;
    let mut total = 0usize;

    for c in text.chars() {
        total += 1;
        if is_punctuation(c) {
            punct += 1;
            continue;
        }
        if is_separator(c) {
            in_word = false;
            continue;
        }
        word_chars += 1;
        if !in_word {
            in_word = true;
            words += 1;
        }
        if c.is_alphabetic() {
            letters += 1;
            if c.is_uppercase() {
                upper += 1;
            }
        }
    }

    SegmentStats {
        word_count: words as f64,
        avg_word_len: if words == 0 {
            0.0
        } else {
            word_chars as f64 / words as f64
        },
        punct_density: if total == 0 {
            0.0
        } else {
            punct as f64 / total as f64
        },
        upper_ratio: if letters == 0 {
            0.0
        } else {
            upper as f64 / letters as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn counts_words_and_lengths() {
        let stats = segment_stats("The sea, the sky.");
        assert_relative_eq!(stats.word_count, 4.0);
        // "The" "sea" "the" "sky" -> 12 chars over 4 words.
        assert_relative_eq!(stats.avg_word_len, 3.0);
    }

    #[test]
    fn punctuation_density() {
        let stats = segment_stats("a,b.");
        assert_relative_eq!(stats.punct_density, 0.5);
    }

    #[test]
    fn typographic_marks_are_punctuation() {
        assert!(is_punctuation('—'));
        assert!(is_punctuation('«'));
        assert!(!is_punctuation('a'));
    }

    #[test]
    fn uppercase_ratio() {
        let stats = segment_stats("AB cd");
        assert_relative_eq!(stats.upper_ratio, 0.5);
    }

    #[test]
    fn empty_text_is_all_zeros() {
        let stats = segment_stats("");
        assert_relative_eq!(stats.word_count, 0.0);
        assert_relative_eq!(stats.avg_word_len, 0.0);
        assert_relative_eq!(stats.punct_density, 0.0);
        assert_relative_eq!(stats.upper_ratio, 0.0);
    }

    #[test]
    fn punctuation_does_not_split_words() {
        // "don't" is one word of five non-punctuation characters minus the
        // apostrophe: 4 word characters.
        let stats = segment_stats("don't");
        assert_relative_eq!(stats.word_count, 1.0);
        assert_relative_eq!(stats.avg_word_len, 4.0);
    }
}
