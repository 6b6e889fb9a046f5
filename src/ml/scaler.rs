//! Per-feature standardization

use super::FEATURE_COUNT;

/// Column-wise standard scaler: each feature is shifted to zero mean and
/// unit variance using statistics from the training split.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    pub means: [f64; FEATURE_COUNT],
    pub stds: [f64; FEATURE_COUNT],
}

impl FeatureScaler {
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut means = [0.0; FEATURE_COUNT];
        let mut stds = [0.0; FEATURE_COUNT];
        if rows.is_empty() {
            return Self { means, stds };
        }

        let n = rows.len() as f64;
        for row in rows {
            for (mean, &x) in means.iter_mut().zip(row.iter()) {
                *mean += x;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n;
        }

        for row in rows {
            for i in 0..FEATURE_COUNT {
                let d = row[i] - means[i];
                stds[i] += d * d;
            }
        }
        for std in stds.iter_mut() {
            *std = (*std / n).sqrt();
        }

        Self { means, stds }
    }

    /// Standardize one row. Constant features map to zero.
    pub fn transform(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            if self.stds[i] != 0.0 {
                out[i] = (row[i] - self.means[i]) / self.stds[i];
            }
        }
        out
    }

    pub fn transform_batch(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
