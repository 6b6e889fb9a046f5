//! Health record model
//!
//! A health record holds the eleven clinical measurements a patient submits
//! for a risk assessment. Categorical measurements are typed enums; the
//! integer codes they carry are the ones stored in the database and fed to
//! the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A submitted set of clinical measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Unique identifier
    pub id: i64,
    /// Owning patient
    pub user_id: i64,
    /// Age in years (1-120)
    pub age: i64,
    /// Biological sex
    pub sex: Sex,
    /// Chest pain classification
    pub chest_pain_type: ChestPainType,
    /// Resting blood pressure in mmHg (50-300)
    pub resting_bp: i64,
    /// Serum cholesterol in mg/dl (50-1000)
    pub cholesterol: i64,
    /// Fasting blood sugar above 120 mg/dl
    pub fasting_bs: bool,
    /// Resting electrocardiogram result
    pub resting_ecg: RestingEcg,
    /// Maximum heart rate achieved in bpm (60-250)
    pub max_hr: i64,
    /// Exercise induced angina
    pub exercise_angina: bool,
    /// ST depression induced by exercise relative to rest (0.0-10.0)
    pub oldpeak: f64,
    /// Slope of the peak exercise ST segment
    pub st_slope: StSlope,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Measurements as submitted by the patient, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecordInput {
    pub age: i64,
    pub sex: Sex,
    pub chest_pain_type: ChestPainType,
    pub resting_bp: i64,
    pub cholesterol: i64,
    pub fasting_bs: bool,
    pub resting_ecg: RestingEcg,
    pub max_hr: i64,
    pub exercise_angina: bool,
    pub oldpeak: f64,
    pub st_slope: StSlope,
}

impl HealthRecordInput {
    /// Validate all measurement ranges.
    ///
    /// Returns the first out-of-range field name and the allowed range.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=120).contains(&self.age) {
            return Err("age must be between 1 and 120".to_string());
        }
        if !(50..=300).contains(&self.resting_bp) {
            return Err("resting_bp must be between 50 and 300 mmHg".to_string());
        }
        if !(50..=1000).contains(&self.cholesterol) {
            return Err("cholesterol must be between 50 and 1000 mg/dl".to_string());
        }
        if !(60..=250).contains(&self.max_hr) {
            return Err("max_hr must be between 60 and 250 bpm".to_string());
        }
        if !(0.0..=10.0).contains(&self.oldpeak) || !self.oldpeak.is_finite() {
            return Err("oldpeak must be between 0.0 and 10.0".to_string());
        }
        Ok(())
    }

    /// Attach an owner, producing a record ready for insertion.
    pub fn into_record(self, user_id: i64) -> HealthRecord {
        HealthRecord {
            id: 0,
            user_id,
            age: self.age,
            sex: self.sex,
            chest_pain_type: self.chest_pain_type,
            resting_bp: self.resting_bp,
            cholesterol: self.cholesterol,
            fasting_bs: self.fasting_bs,
            resting_ecg: self.resting_ecg,
            max_hr: self.max_hr,
            exercise_angina: self.exercise_angina,
            oldpeak: self.oldpeak,
            st_slope: self.st_slope,
            created_at: Utc::now(),
        }
    }
}

/// Biological sex, stored as 0 (female) / 1 (male).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn code(self) -> i64 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }

    pub fn from_code(code: i64) -> anyhow::Result<Self> {
        match code {
            0 => Ok(Sex::Female),
            1 => Ok(Sex::Male),
            _ => Err(anyhow::anyhow!("Invalid sex code: {}", code)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
        }
    }
}

/// Chest pain classification, stored as codes 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChestPainType {
    TypicalAngina,
    AtypicalAngina,
    NonAnginal,
    Asymptomatic,
}

impl ChestPainType {
    pub fn code(self) -> i64 {
        match self {
            ChestPainType::TypicalAngina => 0,
            ChestPainType::AtypicalAngina => 1,
            ChestPainType::NonAnginal => 2,
            ChestPainType::Asymptomatic => 3,
        }
    }

    pub fn from_code(code: i64) -> anyhow::Result<Self> {
        match code {
            0 => Ok(ChestPainType::TypicalAngina),
            1 => Ok(ChestPainType::AtypicalAngina),
            2 => Ok(ChestPainType::NonAnginal),
            3 => Ok(ChestPainType::Asymptomatic),
            _ => Err(anyhow::anyhow!("Invalid chest pain code: {}", code)),
        }
    }
}

/// Resting electrocardiogram result, stored as codes 0-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestingEcg {
    Normal,
    StTAbnormality,
    LvHypertrophy,
}

impl RestingEcg {
    pub fn code(self) -> i64 {
        match self {
            RestingEcg::Normal => 0,
            RestingEcg::StTAbnormality => 1,
            RestingEcg::LvHypertrophy => 2,
        }
    }

    pub fn from_code(code: i64) -> anyhow::Result<Self> {
        match code {
            0 => Ok(RestingEcg::Normal),
            1 => Ok(RestingEcg::StTAbnormality),
            2 => Ok(RestingEcg::LvHypertrophy),
            _ => Err(anyhow::anyhow!("Invalid resting ECG code: {}", code)),
        }
    }
}

/// Slope of the peak exercise ST segment, stored as codes 0-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl StSlope {
    pub fn code(self) -> i64 {
        match self {
            StSlope::Upsloping => 0,
            StSlope::Flat => 1,
            StSlope::Downsloping => 2,
        }
    }

    pub fn from_code(code: i64) -> anyhow::Result<Self> {
        match code {
            0 => Ok(StSlope::Upsloping),
            1 => Ok(StSlope::Flat),
            2 => Ok(StSlope::Downsloping),
            _ => Err(anyhow::anyhow!("Invalid ST slope code: {}", code)),
        }
    }
}

impl HealthRecord {
    /// Feature vector in the order the classifier was trained on.
    pub fn features(&self) -> [f64; 11] {
        [
            self.age as f64,
            self.sex.code() as f64,
            self.chest_pain_type.code() as f64,
            self.resting_bp as f64,
            self.cholesterol as f64,
            if self.fasting_bs { 1.0 } else { 0.0 },
            self.resting_ecg.code() as f64,
            self.max_hr as f64,
            if self.exercise_angina { 1.0 } else { 0.0 },
            self.oldpeak,
            self.st_slope.code() as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_input() -> HealthRecordInput {
        HealthRecordInput {
            age: 54,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::AtypicalAngina,
            resting_bp: 130,
            cholesterol: 246,
            fasting_bs: false,
            resting_ecg: RestingEcg::Normal,
            max_hr: 150,
            exercise_angina: false,
            oldpeak: 1.2,
            st_slope: StSlope::Flat,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_fields() {
        let mut input = sample_input();
        input.age = 0;
        assert!(input.validate().unwrap_err().contains("age"));

        let mut input = sample_input();
        input.resting_bp = 400;
        assert!(input.validate().unwrap_err().contains("resting_bp"));

        let mut input = sample_input();
        input.cholesterol = 20;
        assert!(input.validate().unwrap_err().contains("cholesterol"));

        let mut input = sample_input();
        input.max_hr = 40;
        assert!(input.validate().unwrap_err().contains("max_hr"));

        let mut input = sample_input();
        input.oldpeak = 10.5;
        assert!(input.validate().unwrap_err().contains("oldpeak"));

        let mut input = sample_input();
        input.oldpeak = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_feature_order() {
        let record = sample_input().into_record(7);
        let features = record.features();
        assert_eq!(features.len(), 11);
        assert_eq!(features[0], 54.0); // age
        assert_eq!(features[1], 1.0); // male
        assert_eq!(features[9], 1.2); // oldpeak
    }

    #[test]
    fn test_enum_code_roundtrip() {
        for code in 0..4 {
            assert_eq!(ChestPainType::from_code(code).unwrap().code(), code);
        }
        for code in 0..3 {
            assert_eq!(RestingEcg::from_code(code).unwrap().code(), code);
            assert_eq!(StSlope::from_code(code).unwrap().code(), code);
        }
        assert_eq!(Sex::from_code(0).unwrap(), Sex::Female);
        assert_eq!(Sex::from_code(1).unwrap(), Sex::Male);
        assert!(Sex::from_code(2).is_err());
        assert!(ChestPainType::from_code(4).is_err());
    }
}
