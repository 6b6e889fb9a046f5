//! Repository layer
//!
//! Each entity gets a trait describing its data access surface plus a
//! SQLx-backed implementation. Services depend on the traits, so tests can
//! swap in an in-memory pool without touching service code.

#[cfg(test)]
pub(crate) mod test_support;

pub mod appointment;
pub mod consultation;
pub mod health_record;
pub mod notification;
pub mod prediction;
pub mod session;
pub mod user;

pub use appointment::{AppointmentRepository, AppointmentWithUser, SqlxAppointmentRepository};
pub use consultation::{ConsultationRepository, SqlxConsultationRepository};
pub use health_record::{HealthRecordRepository, SqlxHealthRecordRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use prediction::{PredictionRepository, PredictionWithUser, SqlxPredictionRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Default page size for admin listings.
pub const PAGE_SIZE: i64 = 20;

/// Clamp a 1-based page number and compute the row offset.
pub(crate) fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1) * per_page
}
