//! Reference linear classifier: multinomial softmax regression.
//!
//! Full-batch gradient descent with L2 regularization and zero-initialized
//! weights, so fitting is deterministic without any seed. Exposes one
//! coefficient row per class for feature-importance extraction.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use quill::traits::{Classifier, ClassifierError, LinearClassifier};
use serde::{Deserialize, Serialize};

/// Training configuration for [`SoftmaxRegression`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxConfig {
    /// Gradient-descent step size (default: 0.5)
    pub learning_rate: f64,
    /// Full-batch epochs (default: 300)
    pub epochs: usize,
    /// L2 penalty on the weights (default: 1e-4)
    pub l2: f64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 300,
            l2: 1e-4,
        }
    }
}

/// Multinomial logistic regression fitted in place.
#[derive(Debug, Clone, Default)]
pub struct SoftmaxRegression {
    config: SoftmaxConfig,
    weights: Option<Array2<f64>>,
    bias: Option<Array1<f64>>,
}

impl SoftmaxRegression {
    /// Create an unfitted classifier.
    pub const fn new(config: SoftmaxConfig) -> Self {
        Self {
            config,
            weights: None,
            bias: None,
        }
    }

    /// Row-wise softmax of class scores, shifted for numeric stability.
    fn softmax(mut scores: Array2<f64>) -> Array2<f64> {
        for mut row in scores.rows_mut() {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            }
        }
        scores
    }

    fn scores(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        let weights = self.weights.as_ref().ok_or(ClassifierError::NotFitted)?;
        let bias = self.bias.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != weights.ncols() {
            return Err(ClassifierError::DimensionMismatch {
                expected: weights.ncols(),
                actual: x.ncols(),
            });
        }
        let mut scores = x.dot(&weights.t());
        scores += bias;
        Ok(scores)
    }
}

impl Classifier for SoftmaxRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<(), ClassifierError> {
        if x.nrows() != y.len() || y.is_empty() {
            return Err(ClassifierError::LabelLengthMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        let n_classes = y.iter().copied().max().unwrap_or(0) + 1;
        let n_rows = x.nrows() as f64;

        let mut weights = Array2::<f64>::zeros((n_classes, x.ncols()));
        let mut bias = Array1::<f64>::zeros(n_classes);

        for _ in 0..self.config.epochs {
            let mut scores = x.dot(&weights.t());
            scores += &bias;
            let mut probs = Self::softmax(scores);
            for (row, &class) in y.iter().enumerate() {
                probs[[row, class]] -= 1.0;
            }
            let grad_w = probs.t().dot(&x) / n_rows + &(self.config.l2 * &weights);
            let grad_b = probs.sum_axis(Axis(0)) / n_rows;
            weights -= &(self.config.learning_rate * &grad_w);
            bias -= &(self.config.learning_rate * &grad_b);
        }

        self.weights = Some(weights);
        self.bias = Some(bias);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>, ClassifierError> {
        let scores = self.scores(x)?;
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0)
            })
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        Ok(Self::softmax(self.scores(x)?))
    }
}

impl LinearClassifier for SoftmaxRegression {
    fn coefficients(&self) -> Option<ArrayView2<'_, f64>> {
        self.weights.as_ref().map(Array2::view)
    }
}
