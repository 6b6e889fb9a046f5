//! Session model
//!
//! Sessions are opaque UUID tokens handed out at login and carried back in
//! either the `session` cookie or a Bearer header. A session lives for a
//! fixed window; expiry is checked on every authenticated request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a freshly issued session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

/// An authenticated session bound to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token, also the primary key
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Moment after which the token is no longer accepted
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Issue a fresh session for a user with a random token and the
    /// standard lifetime.
    pub fn issue(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_lifetime() {
        let session = Session::issue(7);
        assert_eq!(session.user_id, 7);
        assert!(!session.is_expired());
        assert_eq!(
            (session.expires_at - session.created_at).num_days(),
            SESSION_TTL_DAYS
        );
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(Session::issue(1).id, Session::issue(1).id);
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let mut session = Session::issue(1);
        session.expires_at = Utc::now() - Duration::minutes(1);
        assert!(session.is_expired());
    }
}
