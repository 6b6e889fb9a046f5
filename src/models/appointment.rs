//! Appointment model
//!
//! Appointments follow a linear workflow: a patient books a pending
//! appointment against one of their predictions; a doctor confirms or rejects
//! it; a confirmed appointment is later completed; the patient can cancel
//! while it is still pending or confirmed. Terminal states never change.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bookable time slots, half-hour grid over morning and afternoon hours.
pub const APPOINTMENT_SLOTS: &[&str] = &[
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30", "15:00", "15:30",
    "16:00", "16:30",
];

/// Appointment entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique identifier
    pub id: i64,
    /// Booking patient
    pub user_id: i64,
    /// Prediction that motivated the booking
    pub prediction_id: i64,
    /// Doctor the appointment was requested with
    pub doctor_name: String,
    /// Scheduled calendar date
    pub scheduled_date: NaiveDate,
    /// Scheduled time slot, one of [`APPOINTMENT_SLOTS`]
    pub scheduled_time: String,
    /// Patient's reason for the visit
    pub reason: String,
    /// Workflow status
    pub status: AppointmentStatus,
    /// Doctor's notes (rejection reason, visit notes)
    pub doctor_notes: Option<String>,
    /// When the last status decision was taken
    pub decided_at: Option<DateTime<Utc>>,
    /// Who took the decision
    pub decided_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for booking a new appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentInput {
    pub prediction_id: i64,
    pub doctor_name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub reason: String,
}

/// Appointment workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Awaiting a doctor's decision
    Pending,
    /// Confirmed by a doctor
    Confirmed,
    /// Rejected by a doctor (with a reason)
    Rejected,
    /// Visit took place
    Completed,
    /// Cancelled by the patient
    Cancelled,
}

impl AppointmentStatus {
    /// Whether the workflow allows moving from `self` to `next`.
    ///
    /// pending -> confirmed | rejected | cancelled
    /// confirmed -> completed | cancelled
    /// rejected, completed, cancelled are terminal.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
        )
    }

    /// Whether the patient may still cancel.
    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(AppointmentStatus::Cancelled)
    }

    /// Whether this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected | AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "rejected" => Ok(AppointmentStatus::Rejected),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid appointment status: {}", s)),
        }
    }
}
