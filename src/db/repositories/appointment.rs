//! Appointment repository
//!
//! Besides CRUD this exposes the slot-occupancy check used at booking time:
//! a slot counts as taken while some appointment holds it in a pending or
//! confirmed state; rejected and cancelled bookings free the slot.

use crate::models::{Appointment, AppointmentStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// An appointment joined with the booking patient, for staff listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AppointmentWithUser {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub username: String,
    pub patient_name: String,
}

/// Appointment repository trait
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Persist a new appointment
    async fn create(&self, appointment: &Appointment) -> Result<Appointment>;

    /// Get an appointment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>>;

    /// Update status, notes and decision metadata
    async fn update(&self, appointment: &Appointment) -> Result<Appointment>;

    /// List a user's appointments, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Appointment>>;

    /// Whether a doctor's slot is held by a pending or confirmed appointment
    async fn slot_taken(&self, doctor_name: &str, date: NaiveDate, time: &str) -> Result<bool>;

    /// Whether the user already holds a pending or confirmed appointment
    async fn has_active_for_user(&self, user_id: i64) -> Result<bool>;

    /// Count all appointments
    async fn count(&self) -> Result<i64>;

    /// Count appointments in a given status
    async fn count_by_status(&self, status: AppointmentStatus) -> Result<i64>;

    /// Staff listing with pagination, optional status filter and a search
    /// term matched against patient username/names and doctor name.
    async fn list(
        &self,
        page: i64,
        per_page: i64,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> Result<(Vec<AppointmentWithUser>, i64)>;

    /// Most recently booked appointments, for the admin dashboard
    async fn recent(&self, limit: i64) -> Result<Vec<AppointmentWithUser>>;

    /// Delete an appointment (admin maintenance)
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based appointment repository implementation
pub struct SqlxAppointmentRepository {
    pool: SqlitePool,
}

impl SqlxAppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn AppointmentRepository> {
        Arc::new(Self::new(pool))
    }
}

const APPOINTMENT_COLUMNS: &str = "id, user_id, prediction_id, doctor_name, scheduled_date, \
     scheduled_time, reason, status, doctor_notes, decided_at, decided_by, created_at";

#[async_trait]
impl AppointmentRepository for SqlxAppointmentRepository {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment> {
        let result = sqlx::query(
            r#"
            INSERT INTO appointments
                (user_id, prediction_id, doctor_name, scheduled_date, scheduled_time,
                 reason, status, doctor_notes, decided_at, decided_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(appointment.user_id)
        .bind(appointment.prediction_id)
        .bind(&appointment.doctor_name)
        .bind(appointment.scheduled_date)
        .bind(&appointment.scheduled_time)
        .bind(&appointment.reason)
        .bind(appointment.status.to_string())
        .bind(&appointment.doctor_notes)
        .bind(appointment.decided_at)
        .bind(&appointment.decided_by)
        .bind(appointment.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create appointment")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Appointment not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = ?",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get appointment")?;

        row.map(|r| row_to_appointment(&r)).transpose()
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET status = ?, doctor_notes = ?, decided_at = ?, decided_by = ?
            WHERE id = ?
            "#,
        )
        .bind(appointment.status.to_string())
        .bind(&appointment.doctor_notes)
        .bind(appointment.decided_at)
        .bind(&appointment.decided_by)
        .bind(appointment.id)
        .execute(&self.pool)
        .await
        .context("Failed to update appointment")?;

        self.get_by_id(appointment.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Appointment not found after update"))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            APPOINTMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list appointments")?;

        rows.iter().map(row_to_appointment).collect()
    }

    async fn slot_taken(&self, doctor_name: &str, date: NaiveDate, time: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM appointments
            WHERE doctor_name = ? AND scheduled_date = ? AND scheduled_time = ?
              AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(doctor_name)
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check slot")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn has_active_for_user(&self, user_id: i64) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM appointments
            WHERE user_id = ? AND status IN ('pending', 'confirmed')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check active appointments")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM appointments")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count appointments")?;
        Ok(row.get("count"))
    }

    async fn count_by_status(&self, status: AppointmentStatus) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM appointments WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count appointments by status")?;
        Ok(row.get("count"))
    }

    async fn list(
        &self,
        page: i64,
        per_page: i64,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> Result<(Vec<AppointmentWithUser>, i64)> {
        let offset = super::page_offset(page, per_page);

        let mut conditions = Vec::new();
        if status.is_some() {
            conditions.push("a.status = ?");
        }
        if search.is_some() {
            conditions.push(
                "(u.username LIKE ? OR u.first_name LIKE ? OR u.last_name LIKE ? OR a.doctor_name LIKE ?)",
            );
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let status_str = status.map(|s| s.to_string());
        let pattern = search.map(|s| format!("%{}%", s));

        let list_sql = format!(
            r#"
            SELECT a.id, a.user_id, a.prediction_id, a.doctor_name, a.scheduled_date,
                   a.scheduled_time, a.reason, a.status, a.doctor_notes, a.decided_at,
                   a.decided_by, a.created_at,
                   u.username, u.first_name, u.last_name
            FROM appointments a
            JOIN users u ON u.id = a.user_id
            {}
            ORDER BY a.scheduled_date ASC, a.scheduled_time ASC, a.id ASC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut query = sqlx::query(&list_sql);
        if let Some(status) = &status_str {
            query = query.bind(status);
        }
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern).bind(pattern).bind(pattern);
        }
        let rows = query
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list appointments")?;

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM appointments a JOIN users u ON u.id = a.user_id {}",
            where_clause
        );
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = &status_str {
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &pattern {
            count_query = count_query
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .bind(pattern);
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count matching appointments")?
            .get("count");

        let mut items = Vec::new();
        for row in rows {
            let first_name: String = row.get("first_name");
            let last_name: String = row.get("last_name");
            items.push(AppointmentWithUser {
                appointment: row_to_appointment(&row)?,
                username: row.get("username"),
                patient_name: format!("{} {}", first_name, last_name),
            });
        }

        Ok((items, total))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AppointmentWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.user_id, a.prediction_id, a.doctor_name, a.scheduled_date,
                   a.scheduled_time, a.reason, a.status, a.doctor_notes, a.decided_at,
                   a.decided_by, a.created_at,
                   u.username, u.first_name, u.last_name
            FROM appointments a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent appointments")?;

        let mut items = Vec::new();
        for row in rows {
            let first_name: String = row.get("first_name");
            let last_name: String = row.get("last_name");
            items.push(AppointmentWithUser {
                appointment: row_to_appointment(&row)?,
                username: row.get("username"),
                patient_name: format!("{} {}", first_name, last_name),
            });
        }
        Ok(items)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete appointment")?;
        Ok(())
    }
}

fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment> {
    let status_str: String = row.get("status");
    let status = AppointmentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid appointment status in database: {}", status_str))?;

    Ok(Appointment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        prediction_id: row.get("prediction_id"),
        doctor_name: row.get("doctor_name"),
        scheduled_date: row.get("scheduled_date"),
        scheduled_time: row.get("scheduled_time"),
        reason: row.get("reason"),
        status,
        doctor_notes: row.get("doctor_notes"),
        decided_at: row.get("decided_at"),
        decided_by: row.get("decided_by"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_prediction, seed_record, seed_user};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{RiskLevel, UserRole};
    use chrono::Utc;

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let user_id = seed_user(&pool, "alice", UserRole::Patient).await;
        let record_id = seed_record(&pool, user_id).await;
        let prediction_id = seed_prediction(&pool, user_id, record_id, RiskLevel::High).await;
        (pool, user_id, prediction_id)
    }

    fn sample_appointment(user_id: i64, prediction_id: i64) -> Appointment {
        Appointment {
            id: 0,
            user_id,
            prediction_id,
            doctor_name: "Dr. Grey".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            scheduled_time: "09:30".to_string(),
            reason: "Follow-up on high risk assessment".to_string(),
            status: AppointmentStatus::Pending,
            doctor_notes: None,
            decided_at: None,
            decided_by: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_update_status() {
        let (pool, user_id, prediction_id) = setup().await;
        let repo = SqlxAppointmentRepository::new(pool);

        let mut appointment = repo
            .create(&sample_appointment(user_id, prediction_id))
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);

        appointment.status = AppointmentStatus::Confirmed;
        appointment.decided_at = Some(Utc::now());
        appointment.decided_by = Some("drbob".to_string());
        let updated = repo.update(&appointment).await.unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.decided_by.as_deref(), Some("drbob"));
        assert!(updated.decided_at.is_some());
    }

    #[tokio::test]
    async fn test_slot_taken() {
        let (pool, user_id, prediction_id) = setup().await;
        let repo = SqlxAppointmentRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();
        assert!(!repo.slot_taken("Dr. Grey", date, "09:30").await.unwrap());

        let mut appointment = repo
            .create(&sample_appointment(user_id, prediction_id))
            .await
            .unwrap();
        assert!(repo.slot_taken("Dr. Grey", date, "09:30").await.unwrap());
        assert!(!repo.slot_taken("Dr. Grey", date, "10:00").await.unwrap());
        assert!(!repo.slot_taken("Dr. House", date, "09:30").await.unwrap());

        // cancelled bookings free the slot
        appointment.status = AppointmentStatus::Cancelled;
        repo.update(&appointment).await.unwrap();
        assert!(!repo.slot_taken("Dr. Grey", date, "09:30").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_active_for_user() {
        let (pool, user_id, prediction_id) = setup().await;
        let repo = SqlxAppointmentRepository::new(pool);

        assert!(!repo.has_active_for_user(user_id).await.unwrap());
        let mut appointment = repo
            .create(&sample_appointment(user_id, prediction_id))
            .await
            .unwrap();
        assert!(repo.has_active_for_user(user_id).await.unwrap());

        appointment.status = AppointmentStatus::Rejected;
        repo.update(&appointment).await.unwrap();
        assert!(!repo.has_active_for_user(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, user_id, prediction_id) = setup().await;
        let repo = SqlxAppointmentRepository::new(pool);

        let appointment = repo
            .create(&sample_appointment(user_id, prediction_id))
            .await
            .unwrap();

        repo.delete(appointment.id).await.unwrap();
        assert!(repo.get_by_id(appointment.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_staff_listing() {
        let (pool, user_id, prediction_id) = setup().await;
        let repo = SqlxAppointmentRepository::new(pool);

        let mut confirmed = sample_appointment(user_id, prediction_id);
        confirmed.scheduled_time = "10:00".to_string();
        let mut confirmed = repo.create(&confirmed).await.unwrap();
        confirmed.status = AppointmentStatus::Confirmed;
        repo.update(&confirmed).await.unwrap();

        repo.create(&sample_appointment(user_id, prediction_id))
            .await
            .unwrap();

        let (pending, total) = repo
            .list(1, 20, Some(AppointmentStatus::Pending), None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(total, 1);
        assert_eq!(pending[0].username, "alice");

        let (by_doctor, _) = repo.list(1, 20, None, Some("Grey")).await.unwrap();
        assert_eq!(by_doctor.len(), 2);

        let recent = repo.recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].username, "alice");

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(
            repo.count_by_status(AppointmentStatus::Confirmed)
                .await
                .unwrap(),
            1
        );
    }
}
