//! Notification service

use crate::db::repositories::NotificationRepository;
use crate::models::Notification;
use anyhow::Context;
use std::sync::Arc;

/// Error types for notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    /// Notification not found (or not owned by the user)
    #[error("Notification not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Notification service
pub struct NotificationService {
    notification_repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<dyn NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    /// A user's notifications, newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<Notification>, NotificationServiceError> {
        Ok(self
            .notification_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list notifications")?)
    }

    /// Number of unread notifications for a user.
    pub async fn unread_count(&self, user_id: i64) -> Result<i64, NotificationServiceError> {
        Ok(self
            .notification_repo
            .unread_count(user_id)
            .await
            .context("Failed to count notifications")?)
    }

    /// Mark one of the user's notifications read. Idempotent: marking an
    /// already-read notification succeeds.
    pub async fn mark_read(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Notification, NotificationServiceError> {
        let notification = self
            .notification_repo
            .get_by_id(id)
            .await
            .context("Failed to get notification")?
            .filter(|n| n.user_id == user_id)
            .ok_or(NotificationServiceError::NotFound)?;

        if !notification.is_read {
            self.notification_repo
                .mark_read(id)
                .await
                .context("Failed to mark notification read")?;
        }

        Ok(Notification {
            is_read: true,
            ..notification
        })
    }

    /// Mark all of a user's notifications read, returning how many changed.
    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationServiceError> {
        Ok(self
            .notification_repo
            .mark_all_read(user_id)
            .await
            .context("Failed to mark notifications read")?)
    }

    /// Delete every read notification, system wide. Admin maintenance.
    pub async fn clear_read(&self) -> Result<u64, NotificationServiceError> {
        Ok(self
            .notification_repo
            .delete_read()
            .await
            .context("Failed to clear notifications")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::seed_user;
    use crate::db::repositories::SqlxNotificationRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NotificationKind, UserRole};

    async fn setup() -> (NotificationService, Arc<dyn NotificationRepository>, i64, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let user_id = seed_user(&pool, "alice", UserRole::Patient).await;
        let other_id = seed_user(&pool, "bob", UserRole::Patient).await;
        let repo = SqlxNotificationRepository::boxed(pool);
        (NotificationService::new(repo.clone()), repo, user_id, other_id)
    }

    fn sample(user_id: i64) -> Notification {
        Notification::new(
            user_id,
            None,
            "High risk assessment",
            "Please see a doctor.",
            NotificationKind::HighRisk,
        )
    }

    #[tokio::test]
    async fn test_mark_read_is_scoped_and_idempotent() {
        let (service, repo, user_id, other_id) = setup().await;
        let created = repo.create(&sample(user_id)).await.unwrap();

        // another user's notification reads as missing
        assert!(matches!(
            service.mark_read(other_id, created.id).await,
            Err(NotificationServiceError::NotFound)
        ));

        let marked = service.mark_read(user_id, created.id).await.unwrap();
        assert!(marked.is_read);
        // second call succeeds
        service.mark_read(user_id, created.id).await.unwrap();
        assert_eq!(service.unread_count(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_and_clear_read() {
        let (service, repo, user_id, _) = setup().await;
        repo.create(&sample(user_id)).await.unwrap();
        repo.create(&sample(user_id)).await.unwrap();

        assert_eq!(service.unread_count(user_id).await.unwrap(), 2);
        assert_eq!(service.mark_all_read(user_id).await.unwrap(), 2);
        assert_eq!(service.clear_read().await.unwrap(), 2);
        assert!(service.list(user_id).await.unwrap().is_empty());
    }
}
