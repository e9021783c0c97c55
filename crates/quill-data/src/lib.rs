//! Dataset preparation for the Quill authorship attribution engine.
//!
//! Turns a corpus of plain-text books (one directory per author) or a
//! prepared CSV into the dataset frame the partitioning engine consumes:
//! one row per segment with `author`, `book`, `text`, denormalized per-book
//! `counts`, class-balanced sampling weights, and optional stylometric count
//! columns.

pub mod corpus;
pub mod error;
pub mod load;
pub mod segment;
pub mod textstats;

pub use corpus::{CorpusCache, CorpusOptions, extract_frame, load_author_segments};
pub use error::{DataError, Result};
pub use load::{LoadOptions, attach_book_counts, attach_class_weights, attach_count_features, load_dataset};
pub use segment::{pack_paragraphs, split_paragraphs};
pub use textstats::{SegmentStats, segment_stats};
