//! Consultation service
//!
//! A rule-based assistant: answers are selected from canned guidance keyed
//! on the prediction outcome and keywords in the question, then recorded so
//! the patient can revisit them.

use crate::db::repositories::{ConsultationRepository, PredictionRepository};
use crate::models::{Consultation, Prediction};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Questions shorter than this carry too little to answer.
const QUESTION_MIN_CHARS: usize = 10;
/// Upper bound on question length.
const QUESTION_MAX_CHARS: usize = 500;

/// Error types for consultation operations
#[derive(Debug, thiserror::Error)]
pub enum ConsultationServiceError {
    /// Validation error (question too short or too long)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Prediction not found (or not owned by the user)
    #[error("Prediction not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Consultation service
pub struct ConsultationService {
    consultation_repo: Arc<dyn ConsultationRepository>,
    prediction_repo: Arc<dyn PredictionRepository>,
}

impl ConsultationService {
    pub fn new(
        consultation_repo: Arc<dyn ConsultationRepository>,
        prediction_repo: Arc<dyn PredictionRepository>,
    ) -> Self {
        Self {
            consultation_repo,
            prediction_repo,
        }
    }

    /// Answer a question about one of the user's predictions and record the
    /// exchange.
    pub async fn ask(
        &self,
        user_id: i64,
        prediction_id: i64,
        question: &str,
    ) -> Result<Consultation, ConsultationServiceError> {
        let question = question.trim();
        if question.len() < QUESTION_MIN_CHARS {
            return Err(ConsultationServiceError::ValidationError(format!(
                "Questions must be at least {} characters",
                QUESTION_MIN_CHARS
            )));
        }
        if question.len() > QUESTION_MAX_CHARS {
            return Err(ConsultationServiceError::ValidationError(format!(
                "Questions are limited to {} characters",
                QUESTION_MAX_CHARS
            )));
        }

        let prediction = self.owned_prediction(user_id, prediction_id).await?;

        let answer = generate_answer(&prediction, question);

        Ok(self
            .consultation_repo
            .create(&Consultation {
                id: 0,
                user_id,
                prediction_id,
                question: question.to_string(),
                answer,
                created_at: Utc::now(),
            })
            .await
            .context("Failed to save consultation")?)
    }

    /// Past consultations about one of the user's predictions, newest first.
    pub async fn history(
        &self,
        user_id: i64,
        prediction_id: i64,
    ) -> Result<Vec<Consultation>, ConsultationServiceError> {
        self.owned_prediction(user_id, prediction_id).await?;
        Ok(self
            .consultation_repo
            .list_for_prediction(prediction_id)
            .await
            .context("Failed to list consultations")?)
    }

    async fn owned_prediction(
        &self,
        user_id: i64,
        prediction_id: i64,
    ) -> Result<Prediction, ConsultationServiceError> {
        self.prediction_repo
            .get_by_id(prediction_id)
            .await
            .context("Failed to get prediction")?
            .filter(|p| p.user_id == user_id)
            .ok_or(ConsultationServiceError::NotFound)
    }
}

/// Select guidance for a question based on the prediction outcome.
fn generate_answer(prediction: &Prediction, question: &str) -> String {
    let question = question.to_lowercase();

    if prediction.positive {
        if question.contains("exercise") {
            "Based on your heart disease risk assessment, I recommend consulting with your \
             doctor before starting any new exercise program. Light activities like walking \
             may be beneficial, but medical supervision is important."
        } else if question.contains("diet") {
            "A heart-healthy diet is crucial. Consider reducing sodium, saturated fats, and \
             processed foods. Increase fruits, vegetables, whole grains, and lean proteins. \
             Please discuss specific dietary changes with your healthcare provider."
        } else if question.contains("medication") {
            "I cannot provide specific medication advice. Please consult with your doctor \
             immediately about your heart disease risk and potential medication needs."
        } else if question.contains("symptoms") {
            "Watch for symptoms like chest pain, shortness of breath, fatigue, dizziness, or \
             irregular heartbeat. Seek immediate medical attention if you experience any \
             concerning symptoms."
        } else {
            "Given your elevated heart disease risk, I strongly recommend scheduling an \
             appointment with a cardiologist for comprehensive evaluation and treatment \
             planning. Early intervention can significantly improve outcomes."
        }
    } else if question.contains("exercise") {
        "Regular exercise is excellent for heart health! Aim for at least 150 minutes of \
         moderate aerobic activity per week. Activities like brisk walking, swimming, or \
         cycling are great choices."
    } else if question.contains("diet") {
        "Maintain a balanced diet rich in fruits, vegetables, whole grains, and lean \
         proteins. Limit processed foods, excessive sodium, and saturated fats to keep your \
         heart healthy."
    } else if question.contains("prevention") {
        "Continue your healthy lifestyle! Regular exercise, balanced diet, stress \
         management, adequate sleep, and avoiding smoking are key to preventing heart \
         disease."
    } else {
        "Your assessment shows lower heart disease risk, which is great! Continue \
         maintaining a healthy lifestyle with regular exercise, balanced nutrition, and \
         routine medical check-ups."
    }
    .to_string()
}
