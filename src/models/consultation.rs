//! Consultation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question asked against a prediction, together with the assistant's
/// recorded answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    /// Unique identifier
    pub id: i64,
    /// Asking user
    pub user_id: i64,
    /// Prediction the question refers to
    pub prediction_id: i64,
    /// The question as submitted
    pub question: String,
    /// The assistant's answer
    pub answer: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
