//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// In-app notification delivered to a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: i64,
    /// Receiving user
    pub user_id: i64,
    /// Related appointment, if any
    pub appointment_id: Option<i64>,
    /// Short title
    pub title: String,
    /// Full message body
    pub message: String,
    /// Notification category
    pub kind: NotificationKind,
    /// Whether the user has opened it
    pub is_read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: i64,
        appointment_id: Option<i64>,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            appointment_id,
            title: title.into(),
            message: message.into(),
            kind,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    AppointmentConfirmed,
    AppointmentRejected,
    AppointmentCancelled,
    HighRisk,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::AppointmentConfirmed => write!(f, "appointment-confirmed"),
            NotificationKind::AppointmentRejected => write!(f, "appointment-rejected"),
            NotificationKind::AppointmentCancelled => write!(f, "appointment-cancelled"),
            NotificationKind::HighRisk => write!(f, "high-risk"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appointment-confirmed" => Ok(NotificationKind::AppointmentConfirmed),
            "appointment-rejected" => Ok(NotificationKind::AppointmentRejected),
            "appointment-cancelled" => Ok(NotificationKind::AppointmentCancelled),
            "high-risk" => Ok(NotificationKind::HighRisk),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(1, Some(2), "Confirmed", "...", NotificationKind::AppointmentConfirmed);
        assert!(!n.is_read);
        assert_eq!(n.appointment_id, Some(2));
    }

    #[test]
    fn test_kind_roundtrip() {
        use NotificationKind::*;
        for kind in [AppointmentConfirmed, AppointmentRejected, AppointmentCancelled, HighRisk] {
            assert_eq!(NotificationKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert!(NotificationKind::from_str("reminder").is_err());
    }
}
