//! Book-aware partitioning, cross-validation and training for authorship
//! attribution.
//!
//! The central constraint is leakage-freedom: all segments of one book must
//! land on the same side of any train/test partition, because segments of a
//! shared book make held-out accuracy meaningless. Books are therefore the
//! atomic unit of splitting; exact target ratios are approximated greedily
//! per author.
//!
//! Everything is synchronous and deterministic: each top-level splitting call
//! creates one seeded generator and threads it through every shuffle, so the
//! same seed over the same frame reproduces the identical partition.

pub mod classifier;
pub mod crossval;
pub mod error;
pub mod importance;
pub mod metrics;
pub mod sampler;
pub mod split;
pub mod training;

pub use classifier::{SoftmaxConfig, SoftmaxRegression};
pub use crossval::{BooksCrossVal, CrossvalConfig, Fold, books_cross_val};
pub use error::{ModelError, Result};
pub use importance::get_top_features;
pub use metrics::{Averaging, f1_score};
pub use sampler::select_sample;
pub use split::{
    BookCount, SplitConfig, SplitPoint, TrainTestSplit, split_books_to_target, train_test_split,
};
pub use training::{TrainConfig, VectorizerSpec, get_encoders, train_crossval_twofold};
