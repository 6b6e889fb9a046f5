//! Notification endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
}

/// GET /api/v1/notifications - The current user's notifications
async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.notification_service.list(user.0.id).await?;
    Ok(Json(notifications))
}

#[derive(Debug, Serialize)]
struct UnreadCountResponse {
    unread: i64,
}

/// GET /api/v1/notifications/unread-count
async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let unread = state.notification_service.unread_count(user.0.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /api/v1/notifications/{id}/read - Mark one notification read
async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state.notification_service.mark_read(user.0.id, id).await?;
    Ok(Json(notification))
}

#[derive(Debug, Serialize)]
struct MarkedResponse {
    marked: u64,
}

/// POST /api/v1/notifications/read-all - Mark every notification read
async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let marked = state.notification_service.mark_all_read(user.0.id).await?;
    Ok(Json(MarkedResponse { marked }))
}
