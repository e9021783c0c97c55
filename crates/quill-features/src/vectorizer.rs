//! TF-IDF vectorization of one text column.

use ndarray::Array2;
use polars::prelude::*;
use quill::traits::{FeatureError, Vectorizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameter bag for one entry of a vectorizer spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfParams {
    /// Keep only the `max_features` most document-frequent terms (None = all)
    pub max_features: Option<usize>,
    /// Drop terms appearing in fewer than `min_df` documents (default: 1)
    pub min_df: usize,
    /// Replace raw term frequency with `1 + ln(tf)` (default: false)
    pub sublinear_tf: bool,
    /// Lowercase documents before tokenizing (default: true)
    pub lowercase: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_features: None,
            min_df: 1,
            sublinear_tf: false,
            lowercase: true,
        }
    }
}

/// TF-IDF vectorizer with smoothed inverse document frequency and
/// L2-normalized rows.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    vocab: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(params: TfidfParams) -> Self {
        Self {
            params,
            vocab: Vec::new(),
            index: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Fitted vocabulary in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocab
    }

    fn tokenize(&self, doc: &str) -> Vec<String> {
        let tokens = doc
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty());
        if self.params.lowercase {
            tokens.map(str::to_lowercase).collect()
        } else {
            tokens.map(str::to_string).collect()
        }
    }
}

impl Vectorizer for TfidfVectorizer {
    fn fit(&mut self, docs: &[&str]) -> Result<(), FeatureError> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in docs {
            let mut seen: Vec<String> = self.tokenize(doc);
            seen.sort_unstable();
            seen.dedup();
            for token in seen {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.params.min_df)
            .collect();
        if let Some(limit) = self.params.max_features {
            // Most frequent first, ties broken lexicographically so the
            // selection is deterministic.
            terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(limit);
        }
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let n_docs = docs.len() as f64;
        self.vocab = terms.iter().map(|(t, _)| t.clone()).collect();
        self.idf = terms
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        self.index = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        tracing::debug!(
            vocabulary = self.vocab.len(),
            documents = docs.len(),
            "fitted tf-idf vectorizer"
        );
        Ok(())
    }

    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>, FeatureError> {
        if self.vocab.is_empty() {
            return Err(FeatureError::NotFitted);
        }
        let mut matrix = Array2::zeros((docs.len(), self.vocab.len()));
        for (row, doc) in docs.iter().enumerate() {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for token in self.tokenize(doc) {
                if let Some(&col) = self.index.get(&token) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }
            let mut norm = 0.0f64;
            for (&col, &count) in &counts {
                let tf = if self.params.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                let value = tf * self.idf[col];
                matrix[[row, col]] = value;
                norm += value * value;
            }
            if norm > 0.0 {
                let norm = norm.sqrt();
                for (&col, _) in &counts {
                    matrix[[row, col]] /= norm;
                }
            }
        }
        Ok(matrix)
    }

    fn n_features(&self) -> usize {
        self.vocab.len()
    }

    fn feature_name(&self, idx: usize) -> Option<&str> {
        self.vocab.get(idx).map(String::as_str)
    }
}

/// Collect a string column into owned documents, nulls becoming empty.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>, FeatureError> {
    let column = df
        .column(name)
        .map_err(|_| FeatureError::MissingColumn(name.to_string()))?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

/// Build one TF-IDF vectorizer fitted on `column` of `df`.
///
/// This is the factory behind each entry of a vectorizer spec: the engine
/// calls it once per feature column, on the current training slice only.
pub fn build_vectorizer(
    df: &DataFrame,
    column: &str,
    params: &TfidfParams,
) -> Result<TfidfVectorizer, FeatureError> {
    let docs = string_column(df, column)?;
    let mut vectorizer = TfidfVectorizer::new(params.clone());
    let borrowed: Vec<&str> = docs.iter().map(String::as_str).collect();
    vectorizer.fit(&borrowed)?;
    if vectorizer.n_features() == 0 {
        return Err(FeatureError::EmptyVocabulary(column.to_string()));
    }
    Ok(vectorizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fitted(docs: &[&str], params: TfidfParams) -> TfidfVectorizer {
        let mut v = TfidfVectorizer::new(params);
        v.fit(docs).unwrap();
        v
    }

    #[test]
    fn vocabulary_is_sorted_and_deterministic() {
        let v = fitted(&["b a", "c a"], TfidfParams::default());
        assert_eq!(v.vocabulary(), &["a", "b", "c"]);
    }

    #[test]
    fn max_features_keeps_most_frequent() {
        let params = TfidfParams {
            max_features: Some(1),
            ..Default::default()
        };
        let v = fitted(&["a b", "a c", "a"], params);
        assert_eq!(v.vocabulary(), &["a"]);
    }

    #[test]
    fn min_df_prunes_rare_terms() {
        let params = TfidfParams {
            min_df: 2,
            ..Default::default()
        };
        let v = fitted(&["a b", "a c"], params);
        assert_eq!(v.vocabulary(), &["a"]);
    }

    #[test]
    fn rows_are_l2_normalized() {
        let v = fitted(&["a b", "c"], TfidfParams::default());
        let m = v.transform(&["a b"]).unwrap();
        let norm: f64 = m.row(0).iter().map(|x| x * x).sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unseen_terms_are_ignored() {
        let v = fitted(&["a b"], TfidfParams::default());
        let m = v.transform(&["z z z"]).unwrap();
        assert_eq!(m.row(0).iter().filter(|x| **x != 0.0).count(), 0);
    }

    #[test]
    fn transform_before_fit_fails() {
        let v = TfidfVectorizer::new(TfidfParams::default());
        assert!(matches!(v.transform(&["a"]), Err(FeatureError::NotFitted)));
    }

    #[test]
    fn lowercase_folds_case() {
        let v = fitted(&["Word word WORD"], TfidfParams::default());
        assert_eq!(v.vocabulary(), &["word"]);
    }
}
