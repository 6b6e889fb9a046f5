//! Consultation endpoints
//!
//! Mounted under `/assessments/{id}/consultations`: questions are always
//! asked about a specific assessment result.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/consultations", get(history).post(ask))
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

/// POST /api/v1/assessments/{id}/consultations - Ask about a prediction
async fn ask(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(prediction_id): Path<i64>,
    Json(body): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let consultation = state
        .consultation_service
        .ask(user.0.id, prediction_id, &body.question)
        .await?;
    Ok((StatusCode::CREATED, Json(consultation)))
}

/// GET /api/v1/assessments/{id}/consultations - Past questions and answers
async fn history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(prediction_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let consultations = state
        .consultation_service
        .history(user.0.id, prediction_id)
        .await?;
    Ok(Json(consultations))
}
