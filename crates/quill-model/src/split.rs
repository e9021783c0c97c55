//! Book-aware train/test splitting.
//!
//! Books are atomic: all segments of one book land on the same side of any
//! partition. Exact target shares are therefore unattainable in general; per
//! author, a greedy single pass picks the shuffled-book prefix whose
//! cumulative segment share lies closest to the target.

use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ModelError, Result};
use quill::schema::{AUTHOR, BOOK, COUNTS};

/// Configuration for one book-aware split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Target share of segments on the train side, in (0, 1)
    pub share: f64,
    /// Seed for the author and book shuffles
    pub seed: u64,
    /// Strict mode used by cross-validation: every author needs at least
    /// two distinct books
    pub cross_val: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            share: 0.5,
            seed: 10,
            cross_val: false,
        }
    }
}

/// A distinct book with its denormalized segment count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCount {
    /// Book identifier
    pub book: String,
    /// Number of segment rows of this book
    pub count: u64,
}

/// Outcome of the greedy prefix partition of one author's books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    /// Books `[..split_idx]` go to train, the rest to test
    pub split_idx: usize,
    /// Segments accumulated on the train side
    pub train_count: u64,
    /// Total segments across all books
    pub total_count: u64,
}

/// Greedily split one author's shuffled books around a target train share.
///
/// The first iterated book is always taken into train, whatever share it
/// induces; a single oversized first book can overshoot the target and is
/// accepted as-is. The last book is never iterated, so the test side of an
/// author with two or more books is never empty. After the bootstrap step,
/// each book is taken only while it moves the cumulative share no farther
/// from the target; the first book that would worsen the distance ends the
/// prefix.
pub fn split_books_to_target(books: &[BookCount], target: f64) -> SplitPoint {
    let total_count: u64 = books.iter().map(|b| b.count).sum();
    let mut train_count = 0u64;
    let mut split_idx = 0usize;

    for book in books.iter().take(books.len().saturating_sub(1)) {
        if train_count == 0 {
            split_idx += 1;
            train_count += book.count;
            continue;
        }
        let new_count = train_count + book.count;
        let new_share = new_count as f64 / total_count as f64;
        let old_share = train_count as f64 / total_count as f64;
        if (target - new_share).abs() > (target - old_share).abs() {
            break;
        }
        split_idx += 1;
        train_count = new_count;
    }

    SplitPoint {
        split_idx,
        train_count,
        total_count,
    }
}

/// One author's distinct books, shuffled into a candidate order.
fn shuffled_books(
    df: &DataFrame,
    author: &str,
    rng: &mut StdRng,
    cross_val: bool,
) -> Result<Vec<BookCount>> {
    let authors = df.column(AUTHOR)?.str()?;
    let books = df.column(BOOK)?.str()?;
    let counts = df.column(COUNTS)?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut distinct = Vec::new();
    for ((row_author, book), count) in authors.into_iter().zip(books).zip(counts) {
        let (Some(row_author), Some(book), Some(count)) = (row_author, book, count) else {
            continue;
        };
        if row_author == author && seen.insert(book) {
            distinct.push(BookCount {
                book: book.to_string(),
                count,
            });
        }
    }

    if cross_val && distinct.len() < 2 {
        return Err(ModelError::InsufficientBooks {
            author: author.to_string(),
            books: distinct.len(),
        });
    }

    distinct.shuffle(rng);
    Ok(distinct)
}

/// Distinct authors in first-appearance order.
fn distinct_authors(df: &DataFrame) -> Result<Vec<String>> {
    let authors = df.column(AUTHOR)?.str()?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for author in authors.into_iter().flatten() {
        if seen.insert(author) {
            out.push(author.to_string());
        }
    }
    Ok(out)
}

/// A materialized book-aware partition of a dataset frame.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Train-side rows, in frame order
    pub train: DataFrame,
    /// Test-side rows, in frame order
    pub test: DataFrame,
    /// Row indices of the train side in the source frame
    pub train_idx: Vec<IdxSize>,
    /// Row indices of the test side in the source frame
    pub test_idx: Vec<IdxSize>,
}

impl TrainTestSplit {
    /// Author labels of the train side.
    pub fn train_labels(&self) -> Result<Vec<String>> {
        labels_of(&self.train)
    }

    /// Author labels of the test side.
    pub fn test_labels(&self) -> Result<Vec<String>> {
        labels_of(&self.test)
    }
}

pub(crate) fn labels_of(df: &DataFrame) -> Result<Vec<String>> {
    df.column(AUTHOR)?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, author)| {
            author
                .map(str::to_string)
                .ok_or(ModelError::NullAuthor(row))
        })
        .collect()
}

/// Split a dataset frame into train and test sides by whole books.
///
/// Per author, independently: shuffle that author's distinct books from the
/// shared seeded generator and cut the shuffled list with
/// [`split_books_to_target`]. Book identifiers accumulate into global train
/// and test sets; rows are assigned by membership of their `book`, so no
/// book ever straddles the split. Re-running with the same seed over the
/// same frame reproduces the identical partition.
///
/// With `cross_val` set, every author must have at least two distinct books
/// (`InsufficientBooks` otherwise): a single-book author cannot be held out
/// without leaking the book it was trained on.
pub fn train_test_split(df: &DataFrame, config: &SplitConfig) -> Result<TrainTestSplit> {
    if df.height() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    if !(config.share > 0.0 && config.share < 1.0) {
        return Err(ModelError::InvalidShare(config.share));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut authors = distinct_authors(df)?;
    authors.shuffle(&mut rng);

    let mut train_books: HashSet<String> = HashSet::new();
    let mut test_books: HashSet<String> = HashSet::new();
    let mut train_segments = 0u64;
    let mut test_segments = 0u64;

    for author in &authors {
        let books = shuffled_books(df, author, &mut rng, config.cross_val)?;
        let point = split_books_to_target(&books, config.share);
        for book in &books[..point.split_idx] {
            train_books.insert(book.book.clone());
        }
        for book in &books[point.split_idx..] {
            test_books.insert(book.book.clone());
        }
        train_segments += point.train_count;
        test_segments += point.total_count - point.train_count;
    }

    let book_column = df.column(BOOK)?.str()?;
    let mut train_idx: Vec<IdxSize> = Vec::new();
    let mut test_idx: Vec<IdxSize> = Vec::new();
    for (row, book) in book_column.into_iter().enumerate() {
        let Some(book) = book else { continue };
        if train_books.contains(book) {
            train_idx.push(row as IdxSize);
        } else if test_books.contains(book) {
            test_idx.push(row as IdxSize);
        }
    }

    // Every row belongs to exactly one side; anything else is a logic
    // defect, not a recoverable condition.
    assert_eq!(
        train_idx.len() + test_idx.len(),
        df.height(),
        "book-aware split dropped or duplicated rows"
    );

    tracing::debug!(
        train_rows = train_idx.len(),
        test_rows = test_idx.len(),
        train_segments,
        test_segments,
        share = config.share,
        seed = config.seed,
        "book-aware split"
    );

    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx.clone()))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx.clone()))?;
    Ok(TrainTestSplit {
        train,
        test,
        train_idx,
        test_idx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn book(name: &str, count: u64) -> BookCount {
        BookCount {
            book: name.to_string(),
            count,
        }
    }

    /// Two authors, two books each: A{a1:3, a2:2}, B{b1:4, b2:1}.
    fn sample_frame() -> DataFrame {
        let rows = [
            ("A", "a1", 3u32),
            ("A", "a1", 3),
            ("A", "a1", 3),
            ("A", "a2", 2),
            ("A", "a2", 2),
            ("B", "b1", 4),
            ("B", "b1", 4),
            ("B", "b1", 4),
            ("B", "b1", 4),
            ("B", "b2", 1),
        ];
        let authors: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let books: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let counts: Vec<u32> = rows.iter().map(|r| r.2).collect();
        let n = rows.len();
        DataFrame::new(vec![
            Column::new(AUTHOR.into(), authors),
            Column::new(BOOK.into(), books),
            Column::new(
                quill::schema::TEXT.into(),
                (0..n).map(|i| format!("segment {i}")).collect::<Vec<_>>(),
            ),
            Column::new(COUNTS.into(), counts),
            Column::new(quill::schema::PROBS.into(), vec![0.1f64; n]),
        ])
        .unwrap()
    }

    #[test]
    fn first_book_is_always_taken() {
        // The first book overshoots a 0.1 target but is taken regardless.
        let books = vec![book("big", 90), book("small", 10), book("tail", 10)];
        let point = split_books_to_target(&books, 0.1);
        assert_eq!(point.split_idx, 1);
        assert_eq!(point.train_count, 90);
    }

    #[test]
    fn last_book_never_enters_train() {
        let books = vec![book("x", 1), book("y", 1)];
        let point = split_books_to_target(&books, 0.99);
        assert_eq!(point.split_idx, 1);
        assert_eq!(point.total_count, 2);
    }

    #[test]
    fn greedy_stops_when_share_worsens() {
        let books = vec![book("a", 5), book("b", 5), book("c", 5), book("d", 5)];
        // After "a" the share is 0.25; adding "b" gives 0.5, exactly on
        // target; adding "c" would give 0.75 and is refused.
        let point = split_books_to_target(&books, 0.5);
        assert_eq!(point.split_idx, 2);
        assert_eq!(point.train_count, 10);
    }

    #[test]
    fn single_book_author_goes_entirely_to_test() {
        let books = vec![book("only", 7)];
        let point = split_books_to_target(&books, 0.5);
        assert_eq!(point.split_idx, 0);
        assert_eq!(point.train_count, 0);
        assert_eq!(point.total_count, 7);
    }

    #[rstest]
    #[case(10)]
    #[case(42)]
    #[case(7)]
    fn split_is_exhaustive_for_any_seed(#[case] seed: u64) {
        let df = sample_frame();
        let config = SplitConfig {
            seed,
            ..Default::default()
        };
        let split = train_test_split(&df, &config).unwrap();
        assert_eq!(split.train.height() + split.test.height(), df.height());
    }

    #[rstest]
    #[case(10)]
    #[case(42)]
    fn no_book_straddles_the_split(#[case] seed: u64) {
        let df = sample_frame();
        let config = SplitConfig {
            seed,
            ..Default::default()
        };
        let split = train_test_split(&df, &config).unwrap();
        let train_books: HashSet<String> = split
            .train
            .column(BOOK)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|b| b.unwrap().to_string())
            .collect();
        let test_books: HashSet<String> = split
            .test
            .column(BOOK)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|b| b.unwrap().to_string())
            .collect();
        assert!(train_books.is_disjoint(&test_books));
    }

    #[test]
    fn same_seed_reproduces_identical_partition() {
        let df = sample_frame();
        let config = SplitConfig::default();
        let first = train_test_split(&df, &config).unwrap();
        let second = train_test_split(&df, &config).unwrap();
        assert_eq!(first.train_idx, second.train_idx);
        assert_eq!(first.test_idx, second.test_idx);
        assert!(first.train.equals(&second.train));
    }

    #[test]
    fn strict_mode_rejects_single_book_authors() {
        let df = DataFrame::new(vec![
            Column::new(AUTHOR.into(), vec!["solo", "solo", "duo", "duo"]),
            Column::new(BOOK.into(), vec!["s1", "s1", "d1", "d2"]),
            Column::new(quill::schema::TEXT.into(), vec!["w", "x", "y", "z"]),
            Column::new(COUNTS.into(), vec![2u32, 2, 1, 1]),
            Column::new(quill::schema::PROBS.into(), vec![0.25f64; 4]),
        ])
        .unwrap();
        let config = SplitConfig {
            cross_val: true,
            ..Default::default()
        };
        let err = train_test_split(&df, &config).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InsufficientBooks { author, books: 1 } if author == "solo"
        ));
    }

    #[test]
    fn out_of_range_share_rejected() {
        let df = sample_frame();
        for share in [0.0, 1.0, -0.5, 1.5] {
            let config = SplitConfig {
                share,
                ..Default::default()
            };
            assert!(matches!(
                train_test_split(&df, &config),
                Err(ModelError::InvalidShare(_))
            ));
        }
    }

    #[test]
    fn null_author_label_is_an_error() {
        let df = DataFrame::new(vec![
            Column::new(AUTHOR.into(), vec![Some("a"), None, Some("b")]),
            Column::new(BOOK.into(), vec!["a1", "a1", "b1"]),
            Column::new(COUNTS.into(), vec![2u32, 2, 1]),
        ])
        .unwrap();
        // A missing author must not become a phantom "" class downstream.
        assert!(matches!(
            labels_of(&df),
            Err(ModelError::NullAuthor(1))
        ));
    }

    #[test]
    fn empty_frame_rejected() {
        let df = DataFrame::new(vec![
            Column::new(AUTHOR.into(), Vec::<String>::new()),
            Column::new(BOOK.into(), Vec::<String>::new()),
            Column::new(COUNTS.into(), Vec::<u32>::new()),
        ])
        .unwrap();
        assert!(matches!(
            train_test_split(&df, &SplitConfig::default()),
            Err(ModelError::EmptyDataset)
        ));
    }
}
