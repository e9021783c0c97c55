//! Leakage-free k-fold cross-validation over books.
//!
//! Folds are generated by repeated binary partitioning: with `k` folds left,
//! the remaining pool is split with target train share `(k-1)/k`; the small
//! side becomes one held-out fold and the large side stays as the pool. When
//! one fold remains, it takes whatever rows are still unconsumed. The `k`
//! test sets are pairwise disjoint and cover the frame; each fold's train
//! set is the full-frame complement of its test set.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ModelError, Result};
use crate::split::{SplitConfig, train_test_split};

/// Configuration for a cross-validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossvalConfig {
    /// Number of folds
    pub k: usize,
    /// Seed reused for every binary partition
    pub seed: u64,
}

impl Default for CrossvalConfig {
    fn default() -> Self {
        Self { k: 5, seed: 10 }
    }
}

/// One cross-validation fold: global row indices into the source frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Complement of `test_idx` over the full frame
    pub train_idx: Vec<IdxSize>,
    /// Held-out rows of this fold
    pub test_idx: Vec<IdxSize>,
}

/// Lazy iterator over the folds of [`books_cross_val`].
#[derive(Debug)]
pub struct BooksCrossVal<'a> {
    df: &'a DataFrame,
    remaining: Vec<IdxSize>,
    k_left: usize,
    seed: u64,
}

impl BooksCrossVal<'_> {
    fn complement(&self, test: &[IdxSize]) -> Vec<IdxSize> {
        let held_out: HashSet<IdxSize> = test.iter().copied().collect();
        (0..self.df.height() as IdxSize)
            .filter(|idx| !held_out.contains(idx))
            .collect()
    }
}

impl Iterator for BooksCrossVal<'_> {
    type Item = Result<Fold>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.k_left == 0 {
            return None;
        }

        if self.k_left == 1 {
            let test_idx = std::mem::take(&mut self.remaining);
            let train_idx = self.complement(&test_idx);
            self.k_left = 0;
            return Some(Ok(Fold {
                train_idx,
                test_idx,
            }));
        }

        let share = (self.k_left - 1) as f64 / self.k_left as f64;
        let pool = match self
            .df
            .take(&IdxCa::from_vec("idx".into(), self.remaining.clone()))
        {
            Ok(pool) => pool,
            Err(err) => {
                self.k_left = 0;
                return Some(Err(err.into()));
            }
        };

        let config = SplitConfig {
            share,
            seed: self.seed,
            cross_val: true,
        };
        let split = match train_test_split(&pool, &config) {
            Ok(split) => split,
            Err(err) => {
                self.k_left = 0;
                return Some(Err(err));
            }
        };

        // The small (test) side of the binary partition is this fold's
        // held-out set; the large (train) side remains as the pool. Local
        // pool indices map back through `remaining` to frame indices.
        let test_idx: Vec<IdxSize> = split
            .test_idx
            .iter()
            .map(|&local| self.remaining[local as usize])
            .collect();
        self.remaining = split
            .train_idx
            .iter()
            .map(|&local| self.remaining[local as usize])
            .collect();

        let train_idx = self.complement(&test_idx);
        self.k_left -= 1;
        tracing::debug!(
            fold_rows = test_idx.len(),
            pool_rows = self.remaining.len(),
            folds_left = self.k_left,
            "emitted cross-validation fold"
        );
        Some(Ok(Fold {
            train_idx,
            test_idx,
        }))
    }
}

/// Lazily generate `k` leakage-free folds over a dataset frame.
///
/// Strict splitting applies throughout: every author must keep at least two
/// distinct books in the shrinking pool, otherwise the iterator yields
/// `InsufficientBooks` and stops.
pub fn books_cross_val<'a>(
    df: &'a DataFrame,
    config: &CrossvalConfig,
) -> Result<BooksCrossVal<'a>> {
    if config.k == 0 {
        return Err(ModelError::InvalidFoldCount(config.k));
    }
    if df.height() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    Ok(BooksCrossVal {
        df,
        remaining: (0..df.height() as IdxSize).collect(),
        k_left: config.k,
        seed: config.seed,
    })
}
