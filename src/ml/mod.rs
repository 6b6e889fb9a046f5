//! Risk classifier
//!
//! A small logistic regression over eleven standardized clinical features.
//! The model is cheap enough to retrain from scratch at every startup, so
//! nothing is serialized to disk.

pub mod dataset;
pub mod logistic;
pub mod scaler;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::config::ModelConfig;
use crate::models::HealthRecord;

use dataset::Cohort;
use logistic::LogisticRegression;
use scaler::FeatureScaler;

/// Number of clinical features the classifier consumes.
pub const FEATURE_COUNT: usize = 11;

/// Feature names, in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "chest_pain_type",
    "resting_bp",
    "cholesterol",
    "fasting_bs",
    "resting_ecg",
    "max_hr",
    "exercise_angina",
    "oldpeak",
    "st_slope",
];

/// Fraction of the cohort used for training; the rest evaluates accuracy.
const TRAIN_FRACTION: f64 = 0.8;

/// Outcome of running the classifier on one record.
#[derive(Debug, Clone, Copy)]
pub struct RiskAssessment {
    /// Whether the classifier flags heart disease
    pub positive: bool,
    /// Confidence in the predicted class, `max(p, 1 - p)`
    pub confidence: f64,
}

/// Trained classifier plus the scaler it was fitted with.
#[derive(Debug, Clone)]
pub struct RiskModel {
    scaler: FeatureScaler,
    model: LogisticRegression,
    accuracy: f64,
}

impl RiskModel {
    /// Synthesize a cohort and train a fresh model.
    pub fn train(config: &ModelConfig) -> Result<Self> {
        info!(
            samples = config.samples,
            seed = config.seed,
            "Training risk model"
        );

        let cohort = Cohort::synthesize(config.samples, config.seed);
        let (train, test) = cohort.split(TRAIN_FRACTION);

        let scaler = FeatureScaler::fit(&train.rows);
        let train_rows = scaler.transform_batch(&train.rows);
        let test_rows = scaler.transform_batch(&test.rows);

        let model = LogisticRegression::fit(
            &train_rows,
            &train.labels,
            config.learning_rate,
            config.epochs,
        )
        .ok_or_else(|| anyhow!("Model training failed: degenerate training data"))?;

        let accuracy = model.accuracy(&test_rows, &test.labels);
        info!(accuracy = format!("{:.4}", accuracy), "Risk model trained");

        Ok(Self {
            scaler,
            model,
            accuracy,
        })
    }

    /// Classify one record's feature vector.
    pub fn assess(&self, features: &[f64; FEATURE_COUNT]) -> RiskAssessment {
        let scaled = self.scaler.transform(features);
        let proba = self.model.predict_proba(&scaled);
        let positive = proba >= 0.5;
        RiskAssessment {
            positive,
            confidence: proba.max(1.0 - proba),
        }
    }

    /// Held-out accuracy measured at training time.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Features ranked by absolute weight, most influential first.
    pub fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        let mut ranked: Vec<_> = FEATURE_NAMES
            .iter()
            .zip(self.model.weights.iter())
            .map(|(&name, &w)| (name, w.abs()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Human-readable risk factors present in a record.
///
/// These mirror the banded thresholds the training cohort was scored with,
/// so the explanation stays consistent with what the model learned.
pub fn explain(record: &HealthRecord) -> Vec<String> {
    let mut explanations = Vec::new();

    if record.age > 65 {
        explanations.push("Advanced age (>65) increases heart disease risk".to_string());
    } else if record.age > 55 {
        explanations.push("Age over 55 is a moderate risk factor".to_string());
    }

    if record.sex == crate::models::Sex::Male {
        explanations.push("Male sex is associated with higher heart disease risk".to_string());
    }

    if record.resting_bp > 160 {
        explanations
            .push("High blood pressure (>160 mmHg) significantly increases risk".to_string());
    } else if record.resting_bp > 140 {
        explanations.push("Elevated blood pressure (>140 mmHg) is a risk factor".to_string());
    }

    if record.cholesterol > 300 {
        explanations.push("Very high cholesterol (>300 mg/dl) is a major risk factor".to_string());
    } else if record.cholesterol > 240 {
        explanations.push("High cholesterol (>240 mg/dl) increases risk".to_string());
    }

    if record.max_hr < 100 {
        explanations
            .push("Low maximum heart rate may indicate poor cardiac fitness".to_string());
    }

    if record.exercise_angina {
        explanations
            .push("Exercise-induced chest pain is a significant warning sign".to_string());
    }

    if record.oldpeak > 2.0 {
        explanations
            .push("Significant ST depression indicates possible coronary disease".to_string());
    }

    explanations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChestPainType, RestingEcg, Sex, StSlope};
    use chrono::Utc;

    fn test_config() -> ModelConfig {
        ModelConfig {
            samples: 1000,
            seed: 42,
            learning_rate: 0.1,
            epochs: 500,
        }
    }

    fn record(
        age: i64,
        resting_bp: i64,
        cholesterol: i64,
        max_hr: i64,
        exercise_angina: bool,
        oldpeak: f64,
    ) -> HealthRecord {
        HealthRecord {
            id: 0,
            user_id: 0,
            age,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::Asymptomatic,
            resting_bp,
            cholesterol,
            fasting_bs: true,
            resting_ecg: RestingEcg::StTAbnormality,
            max_hr,
            exercise_angina,
            oldpeak,
            st_slope: StSlope::Downsloping,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = RiskModel::train(&test_config()).unwrap();
        let b = RiskModel::train(&test_config()).unwrap();
        assert_eq!(a.accuracy(), b.accuracy());
    }

    #[test]
    fn test_model_separates_extremes() {
        let model = RiskModel::train(&test_config()).unwrap();
        assert!(model.accuracy() > 0.8, "accuracy {}", model.accuracy());

        // every risk factor present
        let sick = record(75, 190, 450, 80, true, 4.0);
        let assessment = model.assess(&sick.features());
        assert!(assessment.positive);

        // young, healthy measurements
        let mut healthy = record(25, 100, 150, 180, false, 0.2);
        healthy.sex = Sex::Female;
        healthy.chest_pain_type = ChestPainType::TypicalAngina;
        healthy.fasting_bs = false;
        healthy.resting_ecg = RestingEcg::Normal;
        healthy.st_slope = StSlope::Upsloping;
        let assessment = model.assess(&healthy.features());
        assert!(!assessment.positive);
    }

    #[test]
    fn test_confidence_is_majority_class_probability() {
        let model = RiskModel::train(&test_config()).unwrap();
        let assessment = model.assess(&record(60, 150, 260, 120, true, 2.5).features());
        assert!((0.5..=1.0).contains(&assessment.confidence));
    }

    #[test]
    fn test_feature_importance_is_ranked() {
        let model = RiskModel::train(&test_config()).unwrap();
        let ranked = model.feature_importance();
        assert_eq!(ranked.len(), FEATURE_COUNT);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_explanations_name_present_factors() {
        let explanations = explain(&record(70, 170, 320, 90, true, 3.0));
        assert!(explanations.iter().any(|e| e.contains("Advanced age")));
        assert!(explanations.iter().any(|e| e.contains("High blood pressure")));
        assert!(explanations.iter().any(|e| e.contains("Very high cholesterol")));
        assert!(explanations.iter().any(|e| e.contains("ST depression")));

        let mut healthy = record(30, 110, 160, 170, false, 0.5);
        healthy.sex = crate::models::Sex::Female;
        assert!(explain(&healthy).is_empty());
    }
}
