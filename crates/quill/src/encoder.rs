//! Label encoder: bidirectional author ↔ class-index mapping.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when encoding labels.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A label was not seen during `fit`.
    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// A class index is out of range.
    #[error("class index {index} out of range for {n_classes} classes")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of fitted classes
        n_classes: usize,
    },
}

/// Maps author identifiers to small integer class indices and back.
///
/// Classes are the sorted distinct label set, so an encoder fitted once on
/// the full dataset assigns the same index to an author in every fold.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit an encoder on a label sequence.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        classes.sort_unstable();
        classes.dedup();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Encode labels to class indices.
    pub fn transform<I, S>(&self, labels: I) -> Result<Vec<usize>, EncodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| {
                self.index
                    .get(label.as_ref())
                    .copied()
                    .ok_or_else(|| EncodeError::UnknownLabel(label.as_ref().to_string()))
            })
            .collect()
    }

    /// Decode class indices back to labels.
    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>, EncodeError> {
        codes
            .iter()
            .map(|&index| {
                self.classes
                    .get(index)
                    .cloned()
                    .ok_or(EncodeError::IndexOutOfRange {
                        index,
                        n_classes: self.classes.len(),
                    })
            })
            .collect()
    }

    /// Ordered class labels.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of fitted classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no classes have been fitted.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_sorted_and_distinct() {
        let enc = LabelEncoder::fit(["tolstoy", "chekhov", "tolstoy", "bunin"]);
        assert_eq!(enc.classes(), &["bunin", "chekhov", "tolstoy"]);
    }

    #[test]
    fn transform_roundtrip() {
        let enc = LabelEncoder::fit(["b", "a", "c"]);
        let codes = enc.transform(["c", "a", "b"]).unwrap();
        assert_eq!(codes, vec![2, 0, 1]);
        assert_eq!(
            enc.inverse_transform(&codes).unwrap(),
            vec!["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn unknown_label_is_an_error() {
        let enc = LabelEncoder::fit(["a", "b"]);
        assert!(matches!(
            enc.transform(["z"]),
            Err(EncodeError::UnknownLabel(l)) if l == "z"
        ));
    }

    #[test]
    fn index_is_stable_across_subsets() {
        let enc = LabelEncoder::fit(["a", "b", "c", "d"]);
        // Encoding only a subset of authors must reuse the full-set indices.
        assert_eq!(enc.transform(["d", "b"]).unwrap(), vec![3, 1]);
    }
}
