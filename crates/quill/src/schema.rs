//! Dataset schema: column names and structural validation.
//!
//! A Quill dataset is a polars `DataFrame` where every row is one *segment*,
//! a chunk of one author's book. The `counts` column is denormalized: every
//! row of a book carries the total number of rows of that book.

use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Author identifier column (string).
pub const AUTHOR: &str = "author";
/// Book identifier column (string, globally unique per physical book).
pub const BOOK: &str = "book";
/// Segment text column (string, opaque to the partitioning engine).
pub const TEXT: &str = "text";
/// Rows-per-book column (positive integer, constant within a book).
pub const COUNTS: &str = "counts";
/// Per-row sampling weight column (float, sums to 1 over the frame).
pub const PROBS: &str = "probs";

/// Columns every dataset frame must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [AUTHOR, BOOK, TEXT, COUNTS, PROBS];

/// Errors raised by structural dataset validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required column is absent.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A required column has an unusable dtype.
    #[error("column {column} has dtype {dtype}, expected {expected}")]
    WrongDtype {
        /// Offending column name
        column: String,
        /// Observed dtype
        dtype: String,
        /// Expected dtype family
        expected: String,
    },

    /// `counts` disagrees with the actual number of rows of a book.
    #[error("book {book}: counts column says {declared}, frame has {actual} rows")]
    InconsistentCounts {
        /// Book identifier
        book: String,
        /// Value of the counts column
        declared: u64,
        /// Rows actually present
        actual: u64,
    },

    /// One book identifier appears under two authors.
    #[error("book {book} spans authors {first} and {second}")]
    BookSpansAuthors {
        /// Book identifier
        book: String,
        /// First author seen for the book
        first: String,
        /// Conflicting author
        second: String,
    },

    /// Underlying polars error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

fn check_dtype(df: &DataFrame, column: &str, expected: &str, ok: bool) -> Result<(), SchemaError> {
    if ok {
        Ok(())
    } else {
        Err(SchemaError::WrongDtype {
            column: column.to_string(),
            dtype: df.column(column)?.dtype().to_string(),
            expected: expected.to_string(),
        })
    }
}

/// Validate the structural invariants of a dataset frame.
///
/// Checks that all required columns exist with usable dtypes, that `counts`
/// is constant within each book and equals that book's row count, and that no
/// book identifier spans two authors. Does not inspect `probs` beyond dtype;
/// weight normalization is the sampler's precondition.
pub fn validate_frame(df: &DataFrame) -> Result<(), SchemaError> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(SchemaError::MissingColumn(name.to_string()));
        }
    }

    for name in [AUTHOR, BOOK, TEXT] {
        let dtype = df.column(name)?.dtype().clone();
        check_dtype(df, name, "str", dtype == DataType::String)?;
    }
    check_dtype(df, COUNTS, "integer", df.column(COUNTS)?.dtype().is_integer())?;
    check_dtype(df, PROBS, "float", df.column(PROBS)?.dtype().is_float())?;

    let books = df.column(BOOK)?.str()?;
    let authors = df.column(AUTHOR)?.str()?;
    let counts = df.column(COUNTS)?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;

    let mut declared: HashMap<&str, u64> = HashMap::new();
    let mut actual: HashMap<&str, u64> = HashMap::new();
    let mut owner: HashMap<&str, &str> = HashMap::new();

    for ((book, author), count) in books.into_iter().zip(authors).zip(counts) {
        let (Some(book), Some(author), Some(count)) = (book, author, count) else {
            continue;
        };
        declared.insert(book, count);
        *actual.entry(book).or_insert(0) += 1;
        match owner.get(book) {
            None => {
                owner.insert(book, author);
            }
            Some(first) if *first != author => {
                return Err(SchemaError::BookSpansAuthors {
                    book: book.to_string(),
                    first: (*first).to_string(),
                    second: author.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    for (book, rows) in &actual {
        let says = declared[book];
        if says != *rows {
            return Err(SchemaError::InconsistentCounts {
                book: (*book).to_string(),
                declared: says,
                actual: *rows,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(counts: Vec<u32>) -> DataFrame {
        DataFrame::new(vec![
            Column::new(AUTHOR.into(), vec!["a", "a", "b"]),
            Column::new(BOOK.into(), vec!["a1", "a1", "b1"]),
            Column::new(TEXT.into(), vec!["x", "y", "z"]),
            Column::new(COUNTS.into(), counts),
            Column::new(PROBS.into(), vec![0.25, 0.25, 0.5]),
        ])
        .unwrap()
    }

    #[test]
    fn valid_frame_passes() {
        assert!(validate_frame(&frame(vec![2, 2, 1])).is_ok());
    }

    #[test]
    fn inconsistent_counts_rejected() {
        let err = validate_frame(&frame(vec![3, 3, 1])).unwrap_err();
        assert!(matches!(err, SchemaError::InconsistentCounts { .. }));
    }

    #[test]
    fn missing_column_rejected() {
        let df = frame(vec![2, 2, 1]).drop(PROBS).unwrap();
        let err = validate_frame(&df).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(c) if c == PROBS));
    }

    #[test]
    fn book_spanning_authors_rejected() {
        let df = DataFrame::new(vec![
            Column::new(AUTHOR.into(), vec!["a", "b"]),
            Column::new(BOOK.into(), vec!["shared", "shared"]),
            Column::new(TEXT.into(), vec!["x", "y"]),
            Column::new(COUNTS.into(), vec![2u32, 2]),
            Column::new(PROBS.into(), vec![0.5, 0.5]),
        ])
        .unwrap();
        let err = validate_frame(&df).unwrap_err();
        assert!(matches!(err, SchemaError::BookSpansAuthors { .. }));
    }
}
