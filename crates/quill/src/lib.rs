//! Shared contracts for the Quill authorship attribution engine.
//!
//! This crate owns the dataset schema (column names and frame validation),
//! the label encoder, and the traits that the training engine consumes:
//! vectorizers, feature assemblies, and classifiers. Implementations live in
//! `quill-features` and `quill-model`; everything here is implementation-free
//! so the engine never depends on a concrete feature pipeline.

pub mod encoder;
pub mod schema;
pub mod traits;

pub use encoder::{EncodeError, LabelEncoder};
pub use schema::{SchemaError, validate_frame};
pub use traits::{
    Classifier, ClassifierError, FeatureAssembly, FeatureError, LinearClassifier, Vectorizer,
};
