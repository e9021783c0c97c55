//! Weighted random subsampling of a dataset frame.

use polars::prelude::*;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::error::{ModelError, Result};

/// Accepted deviation of the weight sum from 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Draw `round(fraction * height)` rows using the `probs` column as draw
/// weights, with replacement.
///
/// Weights are used as-is, without renormalization: the caller is expected to
/// have produced class-balanced weights summing to 1 over the full frame
/// (`InvalidWeights` otherwise). Rows come back in draw order, not frame
/// order, and may repeat.
pub fn select_sample<R: Rng>(df: &DataFrame, fraction: f64, rng: &mut R) -> Result<DataFrame> {
    if df.height() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    // Draws are with replacement, so fractions above 1 are meaningful
    // (oversampling); only non-positive fractions are rejected.
    if !(fraction > 0.0 && fraction.is_finite()) {
        return Err(ModelError::InvalidShare(fraction));
    }

    let probs = df.column(quill::schema::PROBS)?.cast(&DataType::Float64)?;
    let weights: Vec<f64> = probs
        .f64()?
        .into_iter()
        .map(|w| w.unwrap_or(0.0))
        .collect();

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ModelError::InvalidWeights {
            sum,
            tolerance: WEIGHT_SUM_TOLERANCE,
        });
    }

    let distribution = WeightedIndex::new(&weights).map_err(|_| ModelError::InvalidWeights {
        sum,
        tolerance: WEIGHT_SUM_TOLERANCE,
    })?;

    let size = (fraction * df.height() as f64).round() as usize;
    let idx: Vec<IdxSize> = (0..size)
        .map(|_| distribution.sample(rng) as IdxSize)
        .collect();

    tracing::debug!(requested = size, height = df.height(), "drew weighted sample");
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}
