//! Synthetic training cohort
//!
//! There is no bundled clinical dataset, so training data is synthesized
//! from established risk factors: each sample draws plausible measurements,
//! scores them against banded thresholds (age, blood pressure, cholesterol,
//! chest pain, and so on), and labels the sample positive when the noisy
//! score clears a fixed cutoff.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FEATURE_COUNT;

/// Labeled feature rows for training and evaluation.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub rows: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<bool>,
}

impl Cohort {
    /// Generate a deterministic cohort of `samples` labeled rows.
    pub fn synthesize(samples: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows = Vec::with_capacity(samples);
        let mut labels = Vec::with_capacity(samples);

        for _ in 0..samples {
            let age = rng.gen_range(20..=80) as f64;
            let sex = rng.gen_range(0..=1) as f64;
            let chest_pain = rng.gen_range(0..=3) as f64;
            let resting_bp = rng.gen_range(90..=200) as f64;
            let cholesterol = rng.gen_range(100..=600) as f64;
            let fasting_bs = rng.gen_range(0..=1) as f64;
            let resting_ecg = rng.gen_range(0..=2) as f64;
            let max_hr = rng.gen_range(60..=220) as f64;
            let exercise_angina = rng.gen_range(0..=1) as f64;
            let oldpeak = rng.gen_range(0.0..6.2);
            let st_slope = rng.gen_range(0..=2) as f64;

            let mut score = 0.0;
            score += match age {
                a if a > 65.0 => 3.0,
                a if a > 55.0 => 2.0,
                a if a > 45.0 => 1.0,
                _ => 0.0,
            };
            score += sex;
            score += chest_pain;
            score += match resting_bp {
                bp if bp > 160.0 => 3.0,
                bp if bp > 140.0 => 2.0,
                bp if bp > 120.0 => 1.0,
                _ => 0.0,
            };
            score += match cholesterol {
                c if c > 300.0 => 3.0,
                c if c > 240.0 => 2.0,
                c if c > 200.0 => 1.0,
                _ => 0.0,
            };
            score += fasting_bs;
            if resting_ecg > 0.0 {
                score += 1.0;
            }
            if max_hr < 100.0 {
                score += 2.0;
            }
            score += exercise_angina * 2.0;
            if oldpeak > 2.0 {
                score += 2.0;
            }
            if st_slope > 1.0 {
                score += 1.0;
            }

            let noise = rng.gen_range(-1.5..1.5);
            labels.push(score + noise > 6.0);
            rows.push([
                age,
                sex,
                chest_pain,
                resting_bp,
                cholesterol,
                fasting_bs,
                resting_ecg,
                max_hr,
                exercise_angina,
                oldpeak,
                st_slope,
            ]);
        }

        Self { rows, labels }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split into train and test partitions; `train_fraction` of the rows
    /// go to the first partition.
    pub fn split(self, train_fraction: f64) -> (Cohort, Cohort) {
        let cut = ((self.rows.len() as f64) * train_fraction).round() as usize;
        let cut = cut.min(self.rows.len());

        let (train_rows, test_rows) = {
            let mut rows = self.rows;
            let test = rows.split_off(cut);
            (rows, test)
        };
        let (train_labels, test_labels) = {
            let mut labels = self.labels;
            let test = labels.split_off(cut);
            (labels, test)
        };

        (
            Cohort {
                rows: train_rows,
                labels: train_labels,
            },
            Cohort {
                rows: test_rows,
                labels: test_labels,
            },
        )
    }
}
