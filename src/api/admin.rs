//! Admin endpoints
//!
//! Dashboards, paginated listings with search, account management, system
//! statistics and the maintenance actions (database backup, clearing read
//! notifications). Everything here sits behind the admin authorization
//! middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{MessageResponse, PaginatedResponse, UserResponse};
use crate::db::repositories::{
    AppointmentRepository, AppointmentWithUser, PredictionRepository, PredictionWithUser,
    UserRepository, PAGE_SIZE,
};
use crate::models::{AppointmentStatus, RiskLevel, UserRole};

/// How many of each entity the dashboard shows as "recent".
const RECENT_LIMIT: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
        .route("/users/{id}/role", put(update_user_role))
        .route("/users/{id}", delete(delete_user))
        .route("/predictions", get(list_predictions))
        .route("/predictions/{id}", delete(delete_prediction))
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}", delete(delete_appointment))
        .route("/system", get(system_stats))
        .route("/system/backup", post(backup))
        .route("/system/clear-notifications", post(clear_notifications))
}

#[derive(Debug, Serialize)]
struct AdminDashboardResponse {
    patients: i64,
    doctors: i64,
    total_users: i64,
    total_predictions: i64,
    high_risk: i64,
    medium_risk: i64,
    low_risk: i64,
    pending_appointments: i64,
    confirmed_appointments: i64,
    total_appointments: i64,
    recent_registrations: Vec<UserResponse>,
    recent_predictions: Vec<PredictionWithUser>,
    recent_appointments: Vec<AppointmentWithUser>,
}

/// GET /api/v1/admin/dashboard - Clinic-wide counters and recent activity
async fn dashboard(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let patients = state
        .user_repo
        .count_by_role(UserRole::Patient)
        .await
        .map_err(internal)?;
    let doctors = state
        .user_repo
        .count_by_role(UserRole::Doctor)
        .await
        .map_err(internal)?;
    let total_users = state.user_repo.count().await.map_err(internal)?;

    let total_predictions = state.prediction_repo.count().await.map_err(internal)?;
    let high_risk = state
        .prediction_repo
        .count_by_risk(RiskLevel::High)
        .await
        .map_err(internal)?;
    let medium_risk = state
        .prediction_repo
        .count_by_risk(RiskLevel::Medium)
        .await
        .map_err(internal)?;
    let low_risk = state
        .prediction_repo
        .count_by_risk(RiskLevel::Low)
        .await
        .map_err(internal)?;

    let pending_appointments = state
        .appointment_repo
        .count_by_status(AppointmentStatus::Pending)
        .await
        .map_err(internal)?;
    let confirmed_appointments = state
        .appointment_repo
        .count_by_status(AppointmentStatus::Confirmed)
        .await
        .map_err(internal)?;
    let total_appointments = state.appointment_repo.count().await.map_err(internal)?;

    // the listings are already ordered newest first, so page one is the
    // recent slice
    let (recent_users, _) = state
        .user_repo
        .list(1, RECENT_LIMIT, None)
        .await
        .map_err(internal)?;
    let (recent_predictions, _) = state
        .prediction_repo
        .list(1, RECENT_LIMIT, None, None)
        .await
        .map_err(internal)?;
    let recent_appointments = state
        .appointment_repo
        .recent(RECENT_LIMIT)
        .await
        .map_err(internal)?;

    Ok(Json(AdminDashboardResponse {
        patients,
        doctors,
        total_users,
        total_predictions,
        high_risk,
        medium_risk,
        low_risk,
        pending_appointments,
        confirmed_appointments,
        total_appointments,
        recent_registrations: recent_users.iter().map(UserResponse::from).collect(),
        recent_predictions,
        recent_appointments,
    }))
}

#[derive(Debug, Deserialize)]
struct UsersQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    search: Option<String>,
}

/// GET /api/v1/admin/users - Paginated users with free-text search
async fn list_users(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<UsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let (users, total) = state
        .user_repo
        .list(page, PAGE_SIZE, query.search.as_deref())
        .await
        .map_err(internal)?;

    let items: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page, PAGE_SIZE, total)))
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    role: String,
}

/// PUT /api/v1/admin/users/{id}/role - Grant or revoke a role
///
/// Admins cannot change their own role, so the clinic always keeps at
/// least the acting administrator.
async fn update_user_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if id == user.0.id {
        return Err(ApiError::conflict("You cannot change your own role"));
    }

    let role =
        UserRole::from_str(&body.role).map_err(|e| ApiError::validation_error(e.to_string()))?;

    let mut target = state
        .user_repo
        .get_by_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    target.role = role;
    let updated = state.user_repo.update(&target).await.map_err(internal)?;

    Ok(Json(UserResponse::from(&updated)))
}

/// DELETE /api/v1/admin/users/{id} - Remove an account and everything it
/// owns (records, predictions, appointments, notifications cascade)
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if id == user.0.id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }

    state
        .user_repo
        .get_by_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    state.user_repo.delete(id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct PredictionsQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    risk: Option<String>,
    #[serde(default)]
    search: Option<String>,
}

/// GET /api/v1/admin/predictions - Paginated predictions, filterable by risk
/// level and patient search
async fn list_predictions(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PredictionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let risk = query
        .risk
        .as_deref()
        .map(RiskLevel::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let page = query.page.unwrap_or(1).max(1);
    let (items, total) = state
        .prediction_repo
        .list(page, PAGE_SIZE, risk, query.search.as_deref())
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::new(items, page, PAGE_SIZE, total)))
}

/// DELETE /api/v1/admin/predictions/{id}
async fn delete_prediction(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .prediction_repo
        .get_by_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Prediction not found"))?;

    state.prediction_repo.delete(id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AppointmentsQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    search: Option<String>,
}

/// GET /api/v1/admin/appointments - Paginated appointments, filterable by
/// status and patient/doctor search
async fn list_appointments(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<AppointmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(AppointmentStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let page = query.page.unwrap_or(1).max(1);
    let (items, total) = state
        .appointment_repo
        .list(page, PAGE_SIZE, status, query.search.as_deref())
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::new(items, page, PAGE_SIZE, total)))
}

/// DELETE /api/v1/admin/appointments/{id}
async fn delete_appointment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .appointment_repo
        .get_by_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    state.appointment_repo.delete(id).await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct TableCounts {
    users: i64,
    predictions: i64,
    appointments: i64,
}

#[derive(Debug, Serialize)]
struct SystemStatsResponse {
    uptime_seconds: u64,
    total_requests: u64,
    avg_response_time_us: f64,
    table_counts: TableCounts,
    model_accuracy: f64,
    feature_importance: Vec<(String, f64)>,
}

/// GET /api/v1/admin/system - Server, table and model statistics
async fn system_stats(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let table_counts = TableCounts {
        users: state.user_repo.count().await.map_err(internal)?,
        predictions: state.prediction_repo.count().await.map_err(internal)?,
        appointments: state.appointment_repo.count().await.map_err(internal)?,
    };

    let feature_importance = state
        .model
        .feature_importance()
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

    Ok(Json(SystemStatsResponse {
        uptime_seconds: state.request_stats.uptime_seconds(),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_us: state.request_stats.avg_response_time_us(),
        table_counts,
        model_accuracy: state.model.accuracy(),
        feature_importance,
    }))
}

#[derive(Debug, Serialize)]
struct BackupResponse {
    path: String,
}

/// POST /api/v1/admin/system/backup - Copy the database file into the
/// backup directory with a timestamped name
async fn backup(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let db_path = state
        .config
        .database
        .url
        .strip_prefix("sqlite:")
        .unwrap_or(&state.config.database.url)
        .to_string();

    let backup_dir = std::path::PathBuf::from(&state.config.database.backup_dir);
    std::fs::create_dir_all(&backup_dir)
        .map_err(|e| ApiError::internal_error(format!("Failed to create backup dir: {}", e)))?;

    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let target = backup_dir.join(format!("cardioguard-{}.db", stamp));

    std::fs::copy(&db_path, &target)
        .map_err(|e| ApiError::internal_error(format!("Backup failed: {}", e)))?;

    tracing::info!(path = %target.display(), "Database backup written");
    Ok(Json(BackupResponse {
        path: target.display().to_string(),
    }))
}

/// POST /api/v1/admin/system/clear-notifications - Delete every read
/// notification
async fn clear_notifications(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.notification_service.clear_read().await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed {} read notifications",
        removed
    ))))
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Admin endpoint error");
    ApiError::internal_error("Internal server error")
}
