//! Error types for dataset preparation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while preparing a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A required column is absent from the input frame.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A corpus directory holds no usable books.
    #[error("no books found under {0}")]
    EmptyCorpus(PathBuf),

    /// A path that should be a directory is not one.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
