//! Loading prepared datasets and attaching derived columns.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{DataError, Result};
use crate::textstats::segment_stats;
use quill::schema::{AUTHOR, BOOK, COUNTS, PROBS, TEXT};

/// Options for [`load_dataset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Attach class-balanced sampling weights (default: true)
    pub with_weights: bool,
    /// Attach stylometric count columns (default: false)
    pub with_count_features: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            with_weights: true,
            with_count_features: false,
        }
    }
}

fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    Ok(column.str()?)
}

/// Attach the denormalized `counts` column: every row of a book carries the
/// total number of rows of that book.
pub fn attach_book_counts(df: &mut DataFrame) -> Result<()> {
    let books = str_column(df, BOOK)?;
    let mut per_book: HashMap<&str, u32> = HashMap::new();
    for book in books.into_iter().flatten() {
        *per_book.entry(book).or_insert(0) += 1;
    }
    let counts: Vec<u32> = books
        .into_iter()
        .map(|book| book.map(|b| per_book[b]).unwrap_or(0))
        .collect();
    df.with_column(Column::new(COUNTS.into(), counts))?;
    Ok(())
}

/// Attach class-balanced sampling weights.
///
/// Each row's weight is `1 / (rows of its author * number of authors)`, so
/// every author contributes the same total mass and the column sums to 1.
pub fn attach_class_weights(df: &mut DataFrame) -> Result<()> {
    let authors = str_column(df, AUTHOR)?;
    let mut per_author: HashMap<&str, u32> = HashMap::new();
    for author in authors.into_iter().flatten() {
        *per_author.entry(author).or_insert(0) += 1;
    }
    let n_authors = per_author.len() as f64;
    let probs: Vec<f64> = authors
        .into_iter()
        .map(|author| {
            author
                .map(|a| 1.0 / (per_author[a] as f64 * n_authors))
                .unwrap_or(0.0)
        })
        .collect();
    df.with_column(Column::new(PROBS.into(), probs))?;
    Ok(())
}

/// Attach the stylometric count columns derived from `text`.
pub fn attach_count_features(df: &mut DataFrame) -> Result<()> {
    let texts = str_column(df, TEXT)?;
    let mut word_count = Vec::with_capacity(df.height());
    let mut avg_word_len = Vec::with_capacity(df.height());
    let mut punct_density = Vec::with_capacity(df.height());
    let mut upper_ratio = Vec::with_capacity(df.height());
    for text in texts {
        let stats = segment_stats(text.unwrap_or(""));
        word_count.push(stats.word_count);
        avg_word_len.push(stats.avg_word_len);
        punct_density.push(stats.punct_density);
        upper_ratio.push(stats.upper_ratio);
    }
    df.with_column(Column::new("word_count".into(), word_count))?;
    df.with_column(Column::new("avg_word_len".into(), avg_word_len))?;
    df.with_column(Column::new("punct_density".into(), punct_density))?;
    df.with_column(Column::new("upper_ratio".into(), upper_ratio))?;
    Ok(())
}

/// Load a prepared CSV dataset and attach the derived columns.
///
/// The CSV must carry at least `author`, `book` and `text`. `counts` is
/// always (re)computed from the loaded rows; weights and count features
/// follow `options`.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    for name in [AUTHOR, BOOK, TEXT] {
        if df.column(name).is_err() {
            return Err(DataError::MissingColumn(name.to_string()));
        }
    }
    attach_book_counts(&mut df)?;
    if options.with_weights {
        attach_class_weights(&mut df)?;
    }
    if options.with_count_features {
        attach_count_features(&mut df)?;
    }
    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        "loaded dataset"
    );
    Ok(df)
}
