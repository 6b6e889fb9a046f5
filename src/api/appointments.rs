//! Patient appointment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{BookAppointmentInput, UserRole};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(book))
        .route("/doctors", get(doctors))
        .route("/slots", get(slots))
        .route("/{id}", get(detail))
        .route("/{id}/cancel", post(cancel))
}

/// GET /api/v1/appointments - The current user's appointments
async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = state.appointment_service.list_for_user(user.0.id).await?;
    Ok(Json(appointments))
}

/// POST /api/v1/appointments - Book an appointment
async fn book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<BookAppointmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state.appointment_service.book(&user.0, body).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// GET /api/v1/appointments/doctors - Doctors available for booking
async fn doctors(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let doctors = state
        .user_repo
        .list_by_role(UserRole::Doctor)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list doctors");
            ApiError::internal_error("Internal server error")
        })?;
    let doctors: Vec<UserResponse> = doctors.iter().map(UserResponse::from).collect();
    Ok(Json(doctors))
}

#[derive(Debug, Deserialize)]
struct SlotsQuery {
    doctor_name: String,
    date: NaiveDate,
}

/// GET /api/v1/appointments/slots?doctor_name=...&date=... - Free slots
async fn slots(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let free = state
        .appointment_service
        .available_slots(&query.doctor_name, query.date)
        .await?;
    Ok(Json(free))
}

/// GET /api/v1/appointments/{id} - One of the current user's appointments
async fn detail(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state.appointment_service.get_for_user(user.0.id, id).await?;
    Ok(Json(appointment))
}

/// POST /api/v1/appointments/{id}/cancel - Cancel a pending or confirmed
/// appointment
async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state.appointment_service.cancel(&user.0, id).await?;
    Ok(Json(appointment))
}
