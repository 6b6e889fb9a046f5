//! Service layer
//!
//! Business logic on top of the repositories. Services own validation and
//! workflow rules; handlers in `api` translate service errors into HTTP
//! responses.

pub mod appointment;
pub mod assessment;
pub mod consultation;
pub mod email;
pub mod notification;
pub mod password;
pub mod rate_limiter;
pub mod user;

pub use appointment::{AppointmentService, AppointmentServiceError};
pub use assessment::{AssessmentOutcome, AssessmentService, AssessmentServiceError};
pub use consultation::{ConsultationService, ConsultationServiceError};
pub use email::EmailService;
pub use notification::{NotificationService, NotificationServiceError};
pub use rate_limiter::LoginRateLimiter;
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
