//! Assessment service
//!
//! Runs the full assessment pipeline: validate the submitted measurements,
//! persist them, classify, derive the risk level, and raise an in-app
//! notification when the result comes back high risk.

use crate::db::repositories::{
    HealthRecordRepository, NotificationRepository, PredictionRepository,
};
use crate::ml::{self, RiskModel};
use crate::models::{
    HealthRecord, HealthRecordInput, Notification, NotificationKind, Prediction, RiskLevel,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

/// Error types for assessment operations
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    /// Validation error (out-of-range measurement)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Assessment not found (or not owned by the requesting user)
    #[error("Assessment not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A completed assessment: the stored record, the stored prediction, and the
/// risk factors found in the measurements.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssessmentOutcome {
    pub record: HealthRecord,
    pub prediction: Prediction,
    pub explanations: Vec<String>,
}

/// Assessment service
pub struct AssessmentService {
    record_repo: Arc<dyn HealthRecordRepository>,
    prediction_repo: Arc<dyn PredictionRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    model: Arc<RiskModel>,
}

impl AssessmentService {
    pub fn new(
        record_repo: Arc<dyn HealthRecordRepository>,
        prediction_repo: Arc<dyn PredictionRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        model: Arc<RiskModel>,
    ) -> Self {
        Self {
            record_repo,
            prediction_repo,
            notification_repo,
            model,
        }
    }

    /// Run an assessment for a user's submitted measurements.
    pub async fn assess(
        &self,
        user_id: i64,
        input: HealthRecordInput,
    ) -> Result<AssessmentOutcome, AssessmentServiceError> {
        input
            .validate()
            .map_err(AssessmentServiceError::ValidationError)?;

        let record = self
            .record_repo
            .create(&input.into_record(user_id))
            .await
            .context("Failed to save health record")?;

        let assessment = self.model.assess(&record.features());
        let risk_level = RiskLevel::derive(assessment.positive, assessment.confidence);

        let prediction = self
            .prediction_repo
            .create(&Prediction {
                id: 0,
                user_id,
                health_record_id: record.id,
                positive: assessment.positive,
                confidence: assessment.confidence,
                risk_level,
                created_at: Utc::now(),
            })
            .await
            .context("Failed to save prediction")?;

        if risk_level == RiskLevel::High {
            // notification failure must not lose the assessment itself
            if let Err(e) = self
                .notification_repo
                .create(&Notification::new(
                    user_id,
                    None,
                    "High risk assessment",
                    "Your latest heart health assessment came back high risk. \
                     Please book an appointment with a doctor.",
                    NotificationKind::HighRisk,
                ))
                .await
            {
                warn!(error = %e, user_id, "Failed to create high-risk notification");
            }
        }

        let explanations = ml::explain(&record);
        Ok(AssessmentOutcome {
            record,
            prediction,
            explanations,
        })
    }

    /// A user's past predictions, newest first.
    pub async fn history(&self, user_id: i64) -> Result<Vec<Prediction>, AssessmentServiceError> {
        Ok(self
            .prediction_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list predictions")?)
    }

    /// A single assessment, scoped to its owner. Requests for another
    /// user's assessment answer as if it did not exist.
    pub async fn get(
        &self,
        user_id: i64,
        prediction_id: i64,
    ) -> Result<AssessmentOutcome, AssessmentServiceError> {
        let prediction = self
            .prediction_repo
            .get_by_id(prediction_id)
            .await
            .context("Failed to get prediction")?
            .filter(|p| p.user_id == user_id)
            .ok_or(AssessmentServiceError::NotFound)?;

        let record = self
            .record_repo
            .get_by_id(prediction.health_record_id)
            .await
            .context("Failed to get health record")?
            .ok_or(AssessmentServiceError::NotFound)?;

        let explanations = ml::explain(&record);
        Ok(AssessmentOutcome {
            record,
            prediction,
            explanations,
        })
    }

    /// Most recent prediction for a user, if any.
    pub async fn latest(&self, user_id: i64) -> Result<Option<Prediction>, AssessmentServiceError> {
        Ok(self
            .prediction_repo
            .latest_for_user(user_id)
            .await
            .context("Failed to get latest prediction")?)
    }
}
