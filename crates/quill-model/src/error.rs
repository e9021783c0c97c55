//! Error types for the partitioning and training engine.

use polars::prelude::PolarsError;
use quill::encoder::EncodeError;
use quill::traits::{ClassifierError, FeatureError};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur during partitioning, sampling and training.
///
/// Configuration and precondition errors are raised at the call that detects
/// them and surface to the caller unmodified; partition-size invariant
/// violations are logic defects and abort via `assert!` instead of appearing
/// here.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Sampling weights do not sum to 1.
    #[error("sampling weights sum to {sum}, expected 1 within {tolerance}")]
    InvalidWeights {
        /// Observed weight sum
        sum: f64,
        /// Accepted deviation from 1
        tolerance: f64,
    },

    /// An author has too few distinct books for a leakage-free fold.
    #[error("author {author} has {books} distinct book(s), cross-validation needs at least 2")]
    InsufficientBooks {
        /// Offending author
        author: String,
        /// Distinct books observed
        books: usize,
    },

    /// Training was requested without any vectorizer configuration.
    #[error("no vectorizer spec supplied")]
    MissingVectorizerSpec,

    /// Classifier coefficient shape disagrees with the class count.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// The dataset frame has no rows.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A row carries no author value.
    #[error("null author at row {0}")]
    NullAuthor(usize),

    /// A split share or sampling fraction is unusable: splits need a value
    /// in (0, 1), sampling needs any positive finite fraction.
    #[error("invalid share or sampling fraction: {0}")]
    InvalidShare(f64),

    /// Cross-validation with zero folds.
    #[error("invalid fold count {0}, expected k >= 1")]
    InvalidFoldCount(usize),

    /// Underlying polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Feature pipeline error.
    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),

    /// Classifier error.
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Label encoding error.
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),
}
