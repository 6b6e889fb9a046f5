//! Notification repository

use crate::models::{Notification, NotificationKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification
    async fn create(&self, notification: &Notification) -> Result<Notification>;

    /// Get a notification by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>>;

    /// List a user's notifications, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Notification>>;

    /// Count a user's unread notifications
    async fn unread_count(&self, user_id: i64) -> Result<i64>;

    /// Mark a single notification read
    async fn mark_read(&self, id: i64) -> Result<()>;

    /// Mark all of a user's notifications read, returning how many changed
    async fn mark_all_read(&self, user_id: i64) -> Result<u64>;

    /// Delete all read notifications, system wide (admin maintenance)
    async fn delete_read(&self) -> Result<u64>;
}

/// SQLx-based notification repository implementation
pub struct SqlxNotificationRepository {
    pool: SqlitePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, appointment_id, title, message, kind, is_read, created_at";

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (user_id, appointment_id, title, message, kind, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.appointment_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.to_string())
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create notification")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Notification not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE id = ?",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get notification")?;

        row.map(|r| row_to_notification(&r)).transpose()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notifications")?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unread notifications")?;
        Ok(row.get("count"))
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark notification read")?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .context("Failed to mark notifications read")?;
        Ok(result.rows_affected())
    }

    async fn delete_read(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE is_read = 1")
            .execute(&self.pool)
            .await
            .context("Failed to delete read notifications")?;
        Ok(result.rows_affected())
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    let kind_str: String = row.get("kind");
    let kind = NotificationKind::from_str(&kind_str)
        .with_context(|| format!("Invalid notification kind in database: {}", kind_str))?;

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        appointment_id: row.get("appointment_id"),
        title: row.get("title"),
        message: row.get("message"),
        kind,
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    })
}
