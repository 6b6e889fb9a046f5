//! Shared API response types
//!
//! Common response structures used across endpoints, plus the mapping from
//! service errors to the JSON error envelope.

use serde::Serialize;

use crate::api::middleware::ApiError;
use crate::models::{User, UserRole};
use crate::services::{
    AppointmentServiceError, AssessmentServiceError, ConsultationServiceError,
    NotificationServiceError, UserServiceError,
};

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Login response: the session token plus the logged-in user.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// Simple acknowledgement response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generic paginated listing.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            items,
            page: page.max(1),
            per_page,
            total,
            total_pages,
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::InternalError(e) => {
                tracing::error!(error = %e, "User service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<AssessmentServiceError> for ApiError {
    fn from(err: AssessmentServiceError) -> Self {
        match err {
            AssessmentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AssessmentServiceError::NotFound => ApiError::not_found("Assessment not found"),
            AssessmentServiceError::InternalError(e) => {
                tracing::error!(error = %e, "Assessment service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<AppointmentServiceError> for ApiError {
    fn from(err: AppointmentServiceError) -> Self {
        match err {
            AppointmentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AppointmentServiceError::NotFound => ApiError::not_found("Appointment not found"),
            AppointmentServiceError::Conflict(msg) => ApiError::conflict(msg),
            AppointmentServiceError::InternalError(e) => {
                tracing::error!(error = %e, "Appointment service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<NotificationServiceError> for ApiError {
    fn from(err: NotificationServiceError) -> Self {
        match err {
            NotificationServiceError::NotFound => ApiError::not_found("Notification not found"),
            NotificationServiceError::InternalError(e) => {
                tracing::error!(error = %e, "Notification service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<ConsultationServiceError> for ApiError {
    fn from(err: ConsultationServiceError) -> Self {
        match err {
            ConsultationServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ConsultationServiceError::NotFound => ApiError::not_found("Prediction not found"),
            ConsultationServiceError::InternalError(e) => {
                tracing::error!(error = %e, "Consultation service error");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}
