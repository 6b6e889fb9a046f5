//! Data models
//!
//! This module contains all data structures used throughout CardioGuard.
//! Models represent:
//! - Database entities (User, Session, HealthRecord, Prediction, Appointment,
//!   Notification, Consultation)
//! - Their status/kind enums with the string encodings stored in the database

mod appointment;
mod consultation;
mod health_record;
mod notification;
mod prediction;
mod session;
mod user;

pub use appointment::{Appointment, AppointmentStatus, BookAppointmentInput, APPOINTMENT_SLOTS};
pub use consultation::Consultation;
pub use health_record::{ChestPainType, HealthRecord, HealthRecordInput, RestingEcg, Sex, StSlope};
pub use notification::{Notification, NotificationKind};
pub use prediction::{Prediction, RiskLevel};
pub use session::{Session, SESSION_TTL_DAYS};
pub use user::{User, UserRole};
