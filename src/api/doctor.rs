//! Doctor endpoints
//!
//! The appointment decision workflow. Everything here sits behind the staff
//! authorization middleware.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::PaginatedResponse;
use crate::db::repositories::{AppointmentRepository, PAGE_SIZE};
use crate::models::AppointmentStatus;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}/confirm", post(confirm))
        .route("/appointments/{id}/reject", post(reject))
        .route("/appointments/{id}/complete", post(complete))
}

#[derive(Debug, Serialize)]
struct DoctorDashboardResponse {
    pending: i64,
    confirmed: i64,
    completed: i64,
}

/// GET /api/v1/doctor/dashboard - Appointment workload counts
async fn dashboard(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = |status| state.appointment_repo.count_by_status(status);
    let pending = count(AppointmentStatus::Pending).await.map_err(internal)?;
    let confirmed = count(AppointmentStatus::Confirmed).await.map_err(internal)?;
    let completed = count(AppointmentStatus::Completed).await.map_err(internal)?;

    Ok(Json(DoctorDashboardResponse {
        pending,
        confirmed,
        completed,
    }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    search: Option<String>,
}

/// GET /api/v1/doctor/appointments - All appointments, filterable by status
/// and patient/doctor search
async fn list_appointments(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(AppointmentStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let page = query.page.unwrap_or(1).max(1);
    let (items, total) = state
        .appointment_service
        .list_all(page, PAGE_SIZE, status, query.search.as_deref())
        .await?;

    Ok(Json(PaginatedResponse::new(items, page, PAGE_SIZE, total)))
}

/// POST /api/v1/doctor/appointments/{id}/confirm
async fn confirm(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state.appointment_service.confirm(&user.0, id).await?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    reason: String,
}

/// POST /api/v1/doctor/appointments/{id}/reject
async fn reject(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state
        .appointment_service
        .reject(&user.0, id, &body.reason)
        .await?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize, Default)]
struct CompleteRequest {
    #[serde(default)]
    notes: Option<String>,
}

/// POST /api/v1/doctor/appointments/{id}/complete
async fn complete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    body: Option<Json<CompleteRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let appointment = state
        .appointment_service
        .complete(&user.0, id, notes.as_deref())
        .await?;
    Ok(Json(appointment))
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Doctor endpoint error");
    ApiError::internal_error("Internal server error")
}
