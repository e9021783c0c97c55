//! Top-weighted feature extraction from a trained linear classifier.

use polars::prelude::*;
use quill::LabelEncoder;
use quill::traits::{ClassifierError, FeatureAssembly, FeatureError, LinearClassifier};

use crate::error::{ModelError, Result};

/// Rank the `n` highest-weighted feature names per class.
///
/// For each class in encoder order, the indices of the `n` largest
/// coefficients are resolved to names through the feature assembly's reverse
/// lookup, largest first. The result has one column per author, each holding
/// that author's ordered top-`n` feature names.
///
/// The coefficient matrix must have exactly one row per encoder class;
/// anything else means the classifier was fitted against a different label
/// encoding and the output would be silently misaligned, so it is rejected
/// with `DimensionMismatch`.
pub fn get_top_features(
    label_encoder: &LabelEncoder,
    assembly: &dyn FeatureAssembly,
    classifier: &dyn LinearClassifier,
    n: usize,
) -> Result<DataFrame> {
    let coeffs = classifier
        .coefficients()
        .ok_or(ClassifierError::NotFitted)?;
    if coeffs.nrows() != label_encoder.len() {
        return Err(ModelError::DimensionMismatch {
            expected: label_encoder.len(),
            actual: coeffs.nrows(),
        });
    }
    if n > coeffs.ncols() {
        return Err(ModelError::DimensionMismatch {
            expected: coeffs.ncols(),
            actual: n,
        });
    }

    let mut columns = Vec::with_capacity(label_encoder.len());
    for (class, author) in label_encoder.classes().iter().enumerate() {
        let row = coeffs.row(class);
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
        let names = order[row.len() - n..]
            .iter()
            .rev()
            .map(|&idx| {
                assembly
                    .find_idx(idx)
                    .ok_or(FeatureError::UnknownIndex(idx))
            })
            .collect::<std::result::Result<Vec<String>, FeatureError>>()?;
        columns.push(Column::new(author.as_str().into(), names));
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ArrayView2};
    use quill::traits::Classifier;
    use std::collections::HashSet;

    /// Fixed-coefficient stand-in for a trained linear classifier.
    #[derive(Debug)]
    struct FixedCoefficients(Array2<f64>);

    impl Classifier for FixedCoefficients {
        fn fit(&mut self, _x: ArrayView2<'_, f64>, _y: &[usize]) -> std::result::Result<(), ClassifierError> {
            Ok(())
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> std::result::Result<Vec<usize>, ClassifierError> {
            Ok(vec![0; x.nrows()])
        }

        fn predict_proba(&self, x: ArrayView2<'_, f64>) -> std::result::Result<Array2<f64>, ClassifierError> {
            Ok(Array2::zeros((x.nrows(), self.0.nrows())))
        }
    }

    impl LinearClassifier for FixedCoefficients {
        fn coefficients(&self) -> Option<ArrayView2<'_, f64>> {
            Some(self.0.view())
        }
    }

    /// Assembly that names column `i` as `f<i>`.
    #[derive(Debug)]
    struct NamedColumns(usize);

    impl FeatureAssembly for NamedColumns {
        fn fit(&mut self, _df: &DataFrame) -> std::result::Result<(), FeatureError> {
            Ok(())
        }

        fn transform(&self, df: &DataFrame) -> std::result::Result<Array2<f64>, FeatureError> {
            Ok(Array2::zeros((df.height(), self.0)))
        }

        fn n_features(&self) -> usize {
            self.0
        }

        fn find_idx(&self, idx: usize) -> Option<String> {
            (idx < self.0).then(|| format!("f{idx}"))
        }
    }

    fn encoder() -> LabelEncoder {
        LabelEncoder::fit(["anna", "boris"])
    }

    #[test]
    fn largest_coefficient_comes_first() {
        let clf = FixedCoefficients(ndarray::array![
            [0.1, 0.9, 0.5, 0.3],
            [0.7, 0.2, 0.8, 0.1],
        ]);
        let table = get_top_features(&encoder(), &NamedColumns(4), &clf, 2).unwrap();
        let anna: Vec<String> = table
            .column("anna")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();
        assert_eq!(anna, vec!["f1", "f2"]);
        let boris: Vec<String> = table
            .column("boris")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();
        assert_eq!(boris, vec!["f2", "f0"]);
    }

    #[test]
    fn returns_n_distinct_features_per_class() {
        let clf = FixedCoefficients(ndarray::array![
            [0.4, 0.1, 0.3, 0.2],
            [0.1, 0.2, 0.3, 0.4],
        ]);
        let table = get_top_features(&encoder(), &NamedColumns(4), &clf, 4).unwrap();
        for author in ["anna", "boris"] {
            let names: Vec<String> = table
                .column(author)
                .unwrap()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.unwrap().to_string())
                .collect();
            assert_eq!(names.len(), 4);
            let distinct: HashSet<&String> = names.iter().collect();
            assert_eq!(distinct.len(), 4, "repeated feature for {author}");
        }
    }

    #[test]
    fn class_count_mismatch_rejected() {
        // Three coefficient rows against a two-class encoder.
        let clf = FixedCoefficients(Array2::zeros((3, 4)));
        let err = get_top_features(&encoder(), &NamedColumns(4), &clf, 2).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn n_larger_than_feature_count_rejected() {
        let clf = FixedCoefficients(Array2::zeros((2, 3)));
        assert!(get_top_features(&encoder(), &NamedColumns(3), &clf, 4).is_err());
    }
}
