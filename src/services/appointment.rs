//! Appointment service
//!
//! Booking and the decision workflow. Status changes go through
//! `AppointmentStatus::can_transition_to`, so an appointment can never skip
//! or revisit a workflow state. Every decision notifies the patient in-app
//! and, when SMTP is configured, by email; email failures are logged and
//! never fail the operation.

use crate::db::repositories::{
    AppointmentRepository, NotificationRepository, PredictionRepository, UserRepository,
};
use crate::db::repositories::appointment::AppointmentWithUser;
use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentInput, Notification, NotificationKind, User,
    APPOINTMENT_SLOTS,
};
use crate::services::email::EmailService;
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::warn;

/// Error types for appointment operations
#[derive(Debug, thiserror::Error)]
pub enum AppointmentServiceError {
    /// Validation error (bad date, slot, or reason)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Appointment or prediction not found (or not owned by the user)
    #[error("Appointment not found")]
    NotFound,

    /// Workflow conflict (slot taken, invalid transition, duplicate booking)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Appointment service
pub struct AppointmentService {
    appointment_repo: Arc<dyn AppointmentRepository>,
    prediction_repo: Arc<dyn PredictionRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    user_repo: Arc<dyn UserRepository>,
    email: Arc<EmailService>,
}

impl AppointmentService {
    pub fn new(
        appointment_repo: Arc<dyn AppointmentRepository>,
        prediction_repo: Arc<dyn PredictionRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        user_repo: Arc<dyn UserRepository>,
        email: Arc<EmailService>,
    ) -> Self {
        Self {
            appointment_repo,
            prediction_repo,
            notification_repo,
            user_repo,
            email,
        }
    }

    /// Book a new pending appointment against one of the user's predictions.
    pub async fn book(
        &self,
        user: &User,
        input: BookAppointmentInput,
    ) -> Result<Appointment, AppointmentServiceError> {
        self.validate_booking(user, &input).await?;

        if self
            .appointment_repo
            .has_active_for_user(user.id)
            .await
            .context("Failed to check active appointments")?
        {
            return Err(AppointmentServiceError::Conflict(
                "You already have a pending or confirmed appointment".to_string(),
            ));
        }

        if self
            .appointment_repo
            .slot_taken(&input.doctor_name, input.scheduled_date, &input.scheduled_time)
            .await
            .context("Failed to check slot")?
        {
            return Err(AppointmentServiceError::Conflict(
                "That time slot is no longer available".to_string(),
            ));
        }

        let appointment = Appointment {
            id: 0,
            user_id: user.id,
            prediction_id: input.prediction_id,
            doctor_name: input.doctor_name,
            scheduled_date: input.scheduled_date,
            scheduled_time: input.scheduled_time,
            reason: input.reason,
            status: AppointmentStatus::Pending,
            doctor_notes: None,
            decided_at: None,
            decided_by: None,
            created_at: Utc::now(),
        };

        Ok(self
            .appointment_repo
            .create(&appointment)
            .await
            .context("Failed to create appointment")?)
    }

    /// A user's appointments, newest first.
    pub async fn list_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentServiceError> {
        Ok(self
            .appointment_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list appointments")?)
    }

    /// A single appointment, scoped to its owner.
    pub async fn get_for_user(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Appointment, AppointmentServiceError> {
        self.appointment_repo
            .get_by_id(id)
            .await
            .context("Failed to get appointment")?
            .filter(|a| a.user_id == user_id)
            .ok_or(AppointmentServiceError::NotFound)
    }

    /// Cancel the patient's own pending or confirmed appointment.
    pub async fn cancel(
        &self,
        user: &User,
        id: i64,
    ) -> Result<Appointment, AppointmentServiceError> {
        let appointment = self.get_for_user(user.id, id).await?;
        if !appointment.status.is_cancellable() {
            return Err(AppointmentServiceError::Conflict(format!(
                "A {} appointment can no longer be cancelled",
                appointment.status
            )));
        }

        let updated = self
            .transition(
                appointment,
                AppointmentStatus::Cancelled,
                &user.username,
                None,
            )
            .await?;

        self.notify(
            &updated,
            NotificationKind::AppointmentCancelled,
            "Appointment cancelled",
            format!(
                "Your appointment with {} on {} at {} has been cancelled.",
                updated.doctor_name, updated.scheduled_date, updated.scheduled_time
            ),
        )
        .await;

        Ok(updated)
    }

    /// Doctor confirms a pending appointment.
    pub async fn confirm(
        &self,
        doctor: &User,
        id: i64,
    ) -> Result<Appointment, AppointmentServiceError> {
        let appointment = self.get_any(id).await?;
        let updated = self
            .transition(appointment, AppointmentStatus::Confirmed, &doctor.username, None)
            .await?;

        self.notify(
            &updated,
            NotificationKind::AppointmentConfirmed,
            "Appointment confirmed",
            format!(
                "Your appointment with {} on {} at {} has been confirmed.",
                updated.doctor_name, updated.scheduled_date, updated.scheduled_time
            ),
        )
        .await;
        self.email_patient(
            &updated,
            "Appointment confirmed",
            format!(
                "Your appointment with {} on {} at {} has been confirmed.",
                updated.doctor_name, updated.scheduled_date, updated.scheduled_time
            ),
        )
        .await;

        Ok(updated)
    }

    /// Doctor rejects a pending appointment. A reason is required and is
    /// stored in the doctor notes.
    pub async fn reject(
        &self,
        doctor: &User,
        id: i64,
        reason: &str,
    ) -> Result<Appointment, AppointmentServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppointmentServiceError::ValidationError(
                "A rejection reason is required".to_string(),
            ));
        }

        let appointment = self.get_any(id).await?;
        let updated = self
            .transition(
                appointment,
                AppointmentStatus::Rejected,
                &doctor.username,
                Some(reason.to_string()),
            )
            .await?;

        self.notify(
            &updated,
            NotificationKind::AppointmentRejected,
            "Appointment rejected",
            format!(
                "Your appointment with {} on {} at {} was rejected: {}",
                updated.doctor_name, updated.scheduled_date, updated.scheduled_time, reason
            ),
        )
        .await;
        self.email_patient(
            &updated,
            "Appointment rejected",
            format!(
                "Your appointment with {} on {} at {} was rejected.\n\nReason: {}",
                updated.doctor_name, updated.scheduled_date, updated.scheduled_time, reason
            ),
        )
        .await;

        Ok(updated)
    }

    /// Doctor marks a confirmed appointment as completed, optionally with
    /// visit notes.
    pub async fn complete(
        &self,
        doctor: &User,
        id: i64,
        notes: Option<&str>,
    ) -> Result<Appointment, AppointmentServiceError> {
        let appointment = self.get_any(id).await?;
        self.transition(
            appointment,
            AppointmentStatus::Completed,
            &doctor.username,
            notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        )
        .await
    }

    /// Staff listing with status filter and patient/doctor search.
    pub async fn list_all(
        &self,
        page: i64,
        per_page: i64,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> Result<(Vec<AppointmentWithUser>, i64), AppointmentServiceError> {
        Ok(self
            .appointment_repo
            .list(page, per_page, status, search)
            .await
            .context("Failed to list appointments")?)
    }

    /// Free slots for a doctor on a date.
    pub async fn available_slots(
        &self,
        doctor_name: &str,
        date: chrono::NaiveDate,
    ) -> Result<Vec<&'static str>, AppointmentServiceError> {
        let mut free = Vec::new();
        for &slot in APPOINTMENT_SLOTS {
            if !self
                .appointment_repo
                .slot_taken(doctor_name, date, slot)
                .await
                .context("Failed to check slot")?
            {
                free.push(slot);
            }
        }
        Ok(free)
    }

    async fn get_any(&self, id: i64) -> Result<Appointment, AppointmentServiceError> {
        self.appointment_repo
            .get_by_id(id)
            .await
            .context("Failed to get appointment")?
            .ok_or(AppointmentServiceError::NotFound)
    }

    async fn transition(
        &self,
        mut appointment: Appointment,
        next: AppointmentStatus,
        decided_by: &str,
        notes: Option<String>,
    ) -> Result<Appointment, AppointmentServiceError> {
        if !appointment.status.can_transition_to(next) {
            return Err(AppointmentServiceError::Conflict(format!(
                "Cannot move a {} appointment to {}",
                appointment.status, next
            )));
        }

        appointment.status = next;
        appointment.decided_at = Some(Utc::now());
        appointment.decided_by = Some(decided_by.to_string());
        if notes.is_some() {
            appointment.doctor_notes = notes;
        }

        Ok(self
            .appointment_repo
            .update(&appointment)
            .await
            .context("Failed to update appointment")?)
    }

    async fn validate_booking(
        &self,
        user: &User,
        input: &BookAppointmentInput,
    ) -> Result<(), AppointmentServiceError> {
        // the prediction must exist and belong to the booking patient
        self.prediction_repo
            .get_by_id(input.prediction_id)
            .await
            .context("Failed to get prediction")?
            .filter(|p| p.user_id == user.id)
            .ok_or(AppointmentServiceError::NotFound)?;

        if input.doctor_name.trim().is_empty() {
            return Err(AppointmentServiceError::ValidationError(
                "A doctor must be selected".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        if input.scheduled_date < today {
            return Err(AppointmentServiceError::ValidationError(
                "Appointment date cannot be in the past".to_string(),
            ));
        }
        if input.scheduled_date > today + Duration::days(365) {
            return Err(AppointmentServiceError::ValidationError(
                "Appointments can be booked at most one year ahead".to_string(),
            ));
        }

        if !APPOINTMENT_SLOTS.contains(&input.scheduled_time.as_str()) {
            return Err(AppointmentServiceError::ValidationError(format!(
                "'{}' is not a bookable time slot",
                input.scheduled_time
            )));
        }

        let reason = input.reason.trim();
        if reason.len() < 10 || reason.len() > 500 {
            return Err(AppointmentServiceError::ValidationError(
                "Reason must be between 10 and 500 characters".to_string(),
            ));
        }

        Ok(())
    }

    async fn notify(
        &self,
        appointment: &Appointment,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        let notification = Notification::new(
            appointment.user_id,
            Some(appointment.id),
            title,
            message,
            kind,
        );
        if let Err(e) = self.notification_repo.create(&notification).await {
            warn!(error = %e, appointment_id = appointment.id, "Failed to create notification");
        }
    }

    async fn email_patient(&self, appointment: &Appointment, subject: &str, body: String) {
        let patient = match self.user_repo.get_by_id(appointment.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to load patient for email");
                return;
            }
        };
        if let Err(e) = self.email.send(&patient.email, subject, &body).await {
            warn!(error = %e, to = %patient.email, "Failed to send appointment email");
        }
    }
}
