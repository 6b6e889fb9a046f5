//! Multivariate logistic regression
//!
//! Trained by full-batch gradient descent on standardized features. Small
//! enough to retrain from scratch at startup.

use super::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl LogisticRegression {
    /// Fit by gradient descent. Returns `None` on degenerate input
    /// (mismatched lengths, empty data, non-positive learning rate).
    pub fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        labels: &[bool],
        learning_rate: f64,
        epochs: usize,
    ) -> Option<Self> {
        if rows.len() != labels.len() || rows.is_empty() {
            return None;
        }
        if !(learning_rate > 0.0) || epochs == 0 {
            return None;
        }

        let n = rows.len() as f64;
        let mut weights = [0.0; FEATURE_COUNT];
        let mut bias = 0.0;

        for _ in 0..epochs {
            let mut grad_w = [0.0; FEATURE_COUNT];
            let mut grad_b = 0.0;

            for (row, &label) in rows.iter().zip(labels.iter()) {
                let target = if label { 1.0 } else { 0.0 };
                let p = sigmoid(dot(&weights, row) + bias);
                let diff = p - target;
                for (g, &x) in grad_w.iter_mut().zip(row.iter()) {
                    *g += diff * x;
                }
                grad_b += diff;
            }

            for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
                *w -= learning_rate * g / n;
            }
            bias -= learning_rate * grad_b / n;
        }

        Some(Self { weights, bias })
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        sigmoid(dot(&self.weights, row) + self.bias)
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> bool {
        self.predict_proba(row) >= 0.5
    }

    /// Fraction of rows classified correctly.
    pub fn accuracy(&self, rows: &[[f64; FEATURE_COUNT]], labels: &[bool]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let correct = rows
            .iter()
            .zip(labels.iter())
            .filter(|(row, &label)| self.predict(row) == label)
            .count();
        correct as f64 / rows.len() as f64
    }
}

fn dot(weights: &[f64; FEATURE_COUNT], row: &[f64; FEATURE_COUNT]) -> f64 {
    weights.iter().zip(row.iter()).map(|(w, x)| w * x).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
