//! Feature pipeline for the Quill authorship attribution engine.
//!
//! Implements the `Vectorizer` and `FeatureAssembly` contracts from the
//! `quill` crate: a TF-IDF vectorizer over one text column, a factory that
//! builds one vectorizer per entry of a vectorizer spec, and the
//! `FeatureBuilder` that stacks raw numeric columns with vectorizer blocks
//! into a single feature matrix with reverse column-name lookup.

pub mod builder;
pub mod vectorizer;

pub use builder::{FeatureBuilder, build_feature_assembly};
pub use vectorizer::{TfidfParams, TfidfVectorizer, build_vectorizer};
