//! Prediction model
//!
//! A prediction is the stored outcome of running the risk classifier over one
//! health record: the binary label, the classifier confidence, and the
//! derived risk level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored classifier outcome for a health record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier
    pub id: i64,
    /// Owning patient
    pub user_id: i64,
    /// Health record this prediction was computed from
    pub health_record_id: i64,
    /// Classifier label: true means heart disease predicted
    pub positive: bool,
    /// Classifier confidence in [0.5, 1.0]
    pub confidence: f64,
    /// Categorical risk derived from label and confidence
    pub risk_level: RiskLevel,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Categorical risk label derived from the classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Confidence at or above which a positive prediction is High risk.
pub(crate) const HIGH_CONFIDENCE: f64 = 0.8;
/// Confidence at or above which a positive prediction is Medium risk.
pub(crate) const MEDIUM_CONFIDENCE: f64 = 0.6;

impl RiskLevel {
    /// Derive the risk level from a classifier label and its confidence.
    ///
    /// A negative prediction is always Low. A positive prediction escalates
    /// with confidence: >= 0.8 High, >= 0.6 Medium, below that Low.
    pub fn derive(positive: bool, confidence: f64) -> Self {
        if !positive {
            return RiskLevel::Low;
        }
        if confidence >= HIGH_CONFIDENCE {
            RiskLevel::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(anyhow::anyhow!("Invalid risk level: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_is_always_low() {
        assert_eq!(RiskLevel::derive(false, 0.99), RiskLevel::Low);
        assert_eq!(RiskLevel::derive(false, 0.5), RiskLevel::Low);
    }

    #[test]
    fn test_positive_escalates_with_confidence() {
        assert_eq!(RiskLevel::derive(true, 0.95), RiskLevel::High);
        assert_eq!(RiskLevel::derive(true, 0.8), RiskLevel::High);
        assert_eq!(RiskLevel::derive(true, 0.79), RiskLevel::Medium);
        assert_eq!(RiskLevel::derive(true, 0.6), RiskLevel::Medium);
        assert_eq!(RiskLevel::derive(true, 0.55), RiskLevel::Low);
    }

    #[test]
    fn test_risk_level_roundtrip() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(RiskLevel::from_str(&level.to_string()).unwrap(), level);
        }
        assert_eq!(RiskLevel::from_str("HIGH").unwrap(), RiskLevel::High);
        assert!(RiskLevel::from_str("critical").is_err());
    }
}
