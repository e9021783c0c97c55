//! Corpus walking: one directory per author, one plain-text book per file.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DataError, Result};
use crate::segment::{pack_paragraphs, split_paragraphs};
use quill::schema::{AUTHOR, BOOK, TEXT};

/// Options for corpus extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusOptions {
    /// Character budget per segment (default: 3000)
    pub symbol_limit: usize,
    /// Number of trailing books (sorted by file name) excluded per author,
    /// reserved for held-out evaluation (default: 0)
    pub reserved_evaluation_books: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            symbol_limit: 3000,
            reserved_evaluation_books: 0,
        }
    }
}

/// Book files of one author, sorted by name, minus the reserved tail.
fn author_books(author_dir: &Path, reserved: usize) -> Result<Vec<PathBuf>> {
    if !author_dir.is_dir() {
        return Err(DataError::NotADirectory(author_dir.to_path_buf()));
    }
    let mut books: Vec<PathBuf> = std::fs::read_dir(author_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    books.sort();
    books.truncate(books.len().saturating_sub(reserved));
    Ok(books)
}

/// Load one author's books as `(book, segment)` pairs.
pub fn load_author_segments(
    corpus_root: &Path,
    author: &str,
    options: &CorpusOptions,
) -> Result<Vec<(String, String)>> {
    let author_dir = corpus_root.join(author);
    let mut segments = Vec::new();
    for path in author_books(&author_dir, options.reserved_evaluation_books)? {
        let book = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read_to_string(&path)?;
        let paragraphs = split_paragraphs(&text);
        for segment in pack_paragraphs(&paragraphs, options.symbol_limit) {
            segments.push((book.clone(), segment));
        }
    }
    tracing::debug!(author, segments = segments.len(), "loaded author corpus");
    Ok(segments)
}

/// Explicit cache of loaded author corpora, keyed by `(author, corpus
/// root)`.
///
/// Independent runs over the same process should call [`clear`] between
/// them; entries are never evicted implicitly.
///
/// [`clear`]: CorpusCache::clear
#[derive(Debug, Default)]
pub struct CorpusCache {
    entries: HashMap<(String, PathBuf), Arc<Vec<(String, String)>>>,
}

impl CorpusCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an author's segments, reusing a previous load of the same
    /// `(author, corpus_root)` pair.
    pub fn get_or_load(
        &mut self,
        corpus_root: &Path,
        author: &str,
        options: &CorpusOptions,
    ) -> Result<Arc<Vec<(String, String)>>> {
        let key = (author.to_string(), corpus_root.to_path_buf());
        if let Some(cached) = self.entries.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(load_author_segments(corpus_root, author, options)?);
        self.entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Number of cached `(author, corpus_root)` entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Walk a corpus root and build the raw dataset frame.
///
/// One subdirectory per author; authors are visited in sorted order so the
/// frame layout is reproducible. The returned frame has `author`, `book`
/// and `text` columns only; counts and weights are attached by
/// [`crate::load::attach_book_counts`] and friends.
pub fn extract_frame(corpus_root: &Path, options: &CorpusOptions) -> Result<DataFrame> {
    if !corpus_root.is_dir() {
        return Err(DataError::NotADirectory(corpus_root.to_path_buf()));
    }
    let mut author_names: Vec<String> = std::fs::read_dir(corpus_root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    author_names.sort();

    let mut authors = Vec::new();
    let mut books = Vec::new();
    let mut texts = Vec::new();
    for author in &author_names {
        for (book, segment) in load_author_segments(corpus_root, author, options)? {
            authors.push(author.clone());
            books.push(book);
            texts.push(segment);
        }
    }
    if authors.is_empty() {
        return Err(DataError::EmptyCorpus(corpus_root.to_path_buf()));
    }

    Ok(DataFrame::new(vec![
        Column::new(AUTHOR.into(), authors),
        Column::new(BOOK.into(), books),
        Column::new(TEXT.into(), texts),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_corpus(root: &Path) {
        for (author, book, text) in [
            ("ahmatova", "evening.txt", "first para\n\nsecond para"),
            ("ahmatova", "rosary.txt", "one more book"),
            ("blok", "verses.txt", "a single paragraph"),
        ] {
            let dir = root.join(author);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(book), text).unwrap();
        }
    }

    #[test]
    fn extracts_sorted_authors_and_book_stems() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());
        let df = extract_frame(tmp.path(), &CorpusOptions::default()).unwrap();
        let authors: Vec<&str> = df
            .column(AUTHOR)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|a| a.unwrap())
            .collect();
        assert_eq!(authors, vec!["ahmatova", "ahmatova", "blok"]);
        let books: Vec<&str> = df
            .column(BOOK)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|b| b.unwrap())
            .collect();
        assert_eq!(books, vec!["evening", "rosary", "verses"]);
    }

    #[test]
    fn reserved_books_are_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());
        let options = CorpusOptions {
            reserved_evaluation_books: 1,
            ..Default::default()
        };
        let segments = load_author_segments(tmp.path(), "ahmatova", &options).unwrap();
        // "rosary" sorts after "evening" and is reserved.
        assert!(segments.iter().all(|(book, _)| book == "evening"));
    }

    #[test]
    fn small_symbol_limit_yields_one_segment_per_paragraph() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());
        let options = CorpusOptions {
            symbol_limit: 1,
            ..Default::default()
        };
        let segments = load_author_segments(tmp.path(), "ahmatova", &options).unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn cache_reuses_loads_and_clears() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());
        let mut cache = CorpusCache::new();
        let options = CorpusOptions::default();
        let first = cache.get_or_load(tmp.path(), "blok", &options).unwrap();
        let second = cache.get_or_load(tmp.path(), "blok", &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_corpus_root_is_an_error() {
        let err = extract_frame(Path::new("/no/such/corpus"), &CorpusOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::NotADirectory(_)));
    }
}
