//! Patient dashboard endpoint

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Appointment, Notification, Prediction, RiskLevel};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

const RECENT_PREDICTIONS: usize = 5;
const RECENT_APPOINTMENTS: usize = 10;
const RECENT_NOTIFICATIONS: usize = 5;

#[derive(Debug, Serialize)]
struct DashboardResponse {
    latest_prediction: Option<Prediction>,
    recent_predictions: Vec<Prediction>,
    total_assessments: usize,
    high_risk_assessments: usize,
    upcoming_appointments: Vec<Appointment>,
    recent_appointments: Vec<Appointment>,
    recent_notifications: Vec<Notification>,
    unread_notifications: i64,
}

/// GET /api/v1/dashboard - Summary of the current user's health activity:
/// the latest and recent predictions with totals, upcoming and recent
/// appointments, and the newest notifications.
async fn dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let latest_prediction = state.assessment_service.latest(user.0.id).await?;
    let predictions = state.assessment_service.history(user.0.id).await?;
    let appointments = state.appointment_service.list_for_user(user.0.id).await?;
    let notifications = state.notification_service.list(user.0.id).await?;
    let unread = state.notification_service.unread_count(user.0.id).await?;

    let total_assessments = predictions.len();
    let high_risk_assessments = predictions
        .iter()
        .filter(|p| p.risk_level == RiskLevel::High)
        .count();

    // pending or confirmed bookings that have not passed yet
    let today = Utc::now().date_naive();
    let upcoming_appointments: Vec<Appointment> = appointments
        .iter()
        .filter(|a| !a.status.is_terminal() && a.scheduled_date >= today)
        .cloned()
        .collect();

    let mut recent_predictions = predictions;
    recent_predictions.truncate(RECENT_PREDICTIONS);

    let mut recent_appointments = appointments;
    recent_appointments.truncate(RECENT_APPOINTMENTS);

    let mut recent_notifications = notifications;
    recent_notifications.truncate(RECENT_NOTIFICATIONS);

    Ok(Json(DashboardResponse {
        latest_prediction,
        recent_predictions,
        total_assessments,
        high_risk_assessments,
        upcoming_appointments,
        recent_appointments,
        recent_notifications,
        unread_notifications: unread,
    }))
}
