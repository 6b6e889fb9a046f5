//! Assessment endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::HealthRecordInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create).get(list))
        .route("/{id}", get(detail))
}

/// POST /api/v1/assessments - Submit measurements and run a risk assessment
async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<HealthRecordInput>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.assessment_service.assess(user.0.id, body).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/assessments - The current user's prediction history
async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.assessment_service.history(user.0.id).await?;
    Ok(Json(history))
}

/// GET /api/v1/assessments/{id} - One assessment with its measurements and
/// risk factor explanations
async fn detail(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.assessment_service.get(user.0.id, id).await?;
    Ok(Json(outcome))
}
