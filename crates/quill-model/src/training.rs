//! Training orchestration over book-aware splits.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use quill::LabelEncoder;
use quill::traits::{Classifier, FeatureAssembly};
use quill_features::{FeatureBuilder, TfidfParams, build_feature_assembly};

use crate::error::{ModelError, Result};
use crate::metrics::{Averaging, f1_score};
use crate::split::{SplitConfig, labels_of, train_test_split};

/// Vectorizer spec: feature-column name → vectorizer parameters.
///
/// Ordered map so the assembled feature layout is deterministic.
pub type VectorizerSpec = BTreeMap<String, TfidfParams>;

/// Configuration for two-fold cross-validated training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Train share of the underlying binary split
    pub split: f64,
    /// Seed for the book-aware split
    pub seed: u64,
    /// F1 averaging mode used for scoring
    pub averaging: Averaging,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            split: 0.5,
            seed: 10,
            averaging: Averaging::Micro,
        }
    }
}

fn spec_entries(spec: &VectorizerSpec) -> Vec<(String, TfidfParams)> {
    spec.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Train and score a classifier on a two-fold book-aware cross-validation.
///
/// One binary split with the configured share; the two role assignments
/// (train on one side, score on the other, then swap) give the two returned
/// F1 scores. Per role assignment the vectorizers are rebuilt and fitted on
/// the current training slice only, while the label encoder is fitted once
/// on the full frame so class indices stay stable across folds.
///
/// The classifier is fitted in place twice; callers must not expect the
/// instance to be isolated between scoring runs.
pub fn train_crossval_twofold<C: Classifier>(
    df: &DataFrame,
    clf: &mut C,
    feature_columns: &[&str],
    vectorizer_spec: Option<&VectorizerSpec>,
    config: &TrainConfig,
) -> Result<Vec<f64>> {
    let spec = vectorizer_spec.ok_or(ModelError::MissingVectorizerSpec)?;
    if df.height() == 0 {
        return Err(ModelError::EmptyDataset);
    }

    let split = train_test_split(
        df,
        &SplitConfig {
            share: config.split,
            seed: config.seed,
            cross_val: false,
        },
    )?;
    let encoder = LabelEncoder::fit(labels_of(df)?);
    let entries = spec_entries(spec);

    let mut scores = Vec::with_capacity(2);
    for (train, test) in [(&split.train, &split.test), (&split.test, &split.train)] {
        let assembly = build_feature_assembly(train, feature_columns, &entries)?;
        let x_train = assembly.transform(train)?;
        let x_test = assembly.transform(test)?;

        let y_train = encoder.transform(labels_of(train)?)?;
        let y_test = encoder.transform(labels_of(test)?)?;

        clf.fit(x_train.view(), &y_train)?;
        let predictions = clf.predict(x_test.view())?;
        let score = f1_score(&y_test, &predictions, encoder.len(), config.averaging)?;
        tracing::debug!(
            score,
            averaging = %config.averaging,
            train_rows = train.height(),
            test_rows = test.height(),
            "scored fold"
        );
        scores.push(score);
    }
    Ok(scores)
}

/// Build the fitted feature assembly and label encoder without training.
///
/// `feature_slice` is the frame the vectorizers are fitted on (typically a
/// training slice); the label encoder is fitted on the full `df` author set.
/// For callers that train a classifier externally but want the exact feature
/// layout the orchestrator would use.
pub fn get_encoders(
    df: &DataFrame,
    feature_slice: &DataFrame,
    feature_columns: &[&str],
    vectorizer_spec: Option<&VectorizerSpec>,
) -> Result<(FeatureBuilder, LabelEncoder)> {
    let spec = vectorizer_spec.ok_or(ModelError::MissingVectorizerSpec)?;
    let assembly = build_feature_assembly(feature_slice, feature_columns, &spec_entries(spec))?;
    let encoder = LabelEncoder::fit(labels_of(df)?);
    Ok((assembly, encoder))
}
