//! Traits at the seams of the training engine.
//!
//! The engine consumes vectorizers, feature assemblies, and classifiers
//! through these explicit interfaces rather than duck typing; concrete
//! implementations live in `quill-features` (TF-IDF, `FeatureBuilder`) and
//! `quill-model` (softmax regression).

use ndarray::{Array2, ArrayView2};
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

/// Errors raised by vectorizers and feature assemblies.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A requested column is absent from the input frame.
    #[error("missing feature column: {0}")]
    MissingColumn(String),

    /// `transform` was called before `fit`.
    #[error("vectorizer used before fitting")]
    NotFitted,

    /// No term survived vocabulary pruning.
    #[error("empty vocabulary for column {0}")]
    EmptyVocabulary(String),

    /// A matrix column index has no corresponding feature name.
    #[error("no feature at matrix column {0}")]
    UnknownIndex(usize),

    /// Underlying polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Errors raised by classifiers.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// `predict` was called before `fit`.
    #[error("classifier used before fitting")]
    NotFitted,

    /// Input matrix shape disagrees with the fitted model.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Labels and feature rows disagree in length.
    #[error("got {rows} feature rows but {labels} labels")]
    LabelLengthMismatch {
        /// Feature matrix rows
        rows: usize,
        /// Label count
        labels: usize,
    },
}

/// Turns a list of text documents into a numeric matrix.
pub trait Vectorizer {
    /// Learn the vocabulary from training documents.
    fn fit(&mut self, docs: &[&str]) -> Result<(), FeatureError>;

    /// Encode documents into a `docs × n_features` matrix.
    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>, FeatureError>;

    /// Width of the transformed matrix.
    fn n_features(&self) -> usize;

    /// Human-readable name of one output column.
    fn feature_name(&self, idx: usize) -> Option<&str>;
}

/// Turns raw dataframe columns plus vectorizer outputs into one feature
/// matrix, with reverse lookup from matrix column to feature name.
pub trait FeatureAssembly {
    /// Fit the owned vectorizers on a training slice.
    fn fit(&mut self, df: &DataFrame) -> Result<(), FeatureError>;

    /// Transform a slice into a numeric matrix without refitting.
    fn transform(&self, df: &DataFrame) -> Result<Array2<f64>, FeatureError>;

    /// Fit on `df` and transform it in one call.
    fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>, FeatureError> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Total width of the assembled matrix.
    fn n_features(&self) -> usize;

    /// Map a matrix column index back to a feature name.
    fn find_idx(&self, idx: usize) -> Option<String>;
}

/// A multiclass classifier fitted in place.
///
/// Fitting mutates the instance; concurrent training runs against one
/// classifier are unsafe and must be serialized by the caller.
pub trait Classifier {
    /// Fit on a feature matrix and encoded labels.
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), ClassifierError>;

    /// Predict class indices for each row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, ClassifierError>;

    /// Predict per-class probabilities, one row per input row.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError>;
}

/// A classifier exposing per-class coefficient rows, aligned with the label
/// encoder's class order. Required for feature-importance extraction.
pub trait LinearClassifier: Classifier {
    /// Coefficient matrix, one row per class. `None` before fitting.
    fn coefficients(&self) -> Option<ArrayView2<'_, f64>>;
}
