//! F1 scoring for encoded multiclass predictions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Averaging mode for multiclass F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Averaging {
    /// Global counts of true/false positives across classes
    #[default]
    #[display("micro")]
    Micro,
    /// Unweighted mean of per-class F1
    #[display("macro")]
    Macro,
    /// Support-weighted mean of per-class F1
    #[display("weighted")]
    Weighted,
}

fn f1(tp: f64, fp: f64, fn_: f64) -> f64 {
    let denom = 2.0 * tp + fp + fn_;
    if denom == 0.0 { 0.0 } else { 2.0 * tp / denom }
}

/// Multiclass F1 over encoded labels.
///
/// `y_true` and `y_pred` must have equal length and every label must lie
/// below `n_classes`; classes absent from `y_true` contribute zero to macro
/// averaging, matching the usual convention.
pub fn f1_score(y_true: &[usize], y_pred: &[usize], n_classes: usize, avg: Averaging) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::DimensionMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }

    let mut tp = vec![0u64; n_classes];
    let mut fp = vec![0u64; n_classes];
    let mut fn_ = vec![0u64; n_classes];
    let mut support = vec![0u64; n_classes];

    for (&truth, &pred) in y_true.iter().zip(y_pred) {
        if truth >= n_classes || pred >= n_classes {
            return Err(ModelError::DimensionMismatch {
                expected: n_classes,
                actual: truth.max(pred) + 1,
            });
        }
        support[truth] += 1;
        if truth == pred {
            tp[truth] += 1;
        } else {
            fp[pred] += 1;
            fn_[truth] += 1;
        }
    }

    let score = match avg {
        Averaging::Micro => f1(
            tp.iter().sum::<u64>() as f64,
            fp.iter().sum::<u64>() as f64,
            fn_.iter().sum::<u64>() as f64,
        ),
        Averaging::Macro => {
            if n_classes == 0 {
                0.0
            } else {
                (0..n_classes)
                    .map(|c| f1(tp[c] as f64, fp[c] as f64, fn_[c] as f64))
                    .sum::<f64>()
                    / n_classes as f64
            }
        }
        Averaging::Weighted => {
            let total: u64 = support.iter().sum();
            if total == 0 {
                0.0
            } else {
                (0..n_classes)
                    .map(|c| {
                        f1(tp[c] as f64, fp[c] as f64, fn_[c] as f64) * support[c] as f64
                    })
                    .sum::<f64>()
                    / total as f64
            }
        }
    };
    Ok(score)
}
