//! Health record repository

use crate::models::{ChestPainType, HealthRecord, RestingEcg, Sex, StSlope};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Health record repository trait
#[async_trait]
pub trait HealthRecordRepository: Send + Sync {
    /// Persist a new record
    async fn create(&self, record: &HealthRecord) -> Result<HealthRecord>;

    /// Get a record by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<HealthRecord>>;

    /// List a user's records, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<HealthRecord>>;
}

/// SQLx-based health record repository implementation
pub struct SqlxHealthRecordRepository {
    pool: SqlitePool,
}

impl SqlxHealthRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn HealthRecordRepository> {
        Arc::new(Self::new(pool))
    }
}

const RECORD_COLUMNS: &str = "id, user_id, age, sex, chest_pain_type, resting_bp, cholesterol, \
     fasting_bs, resting_ecg, max_hr, exercise_angina, oldpeak, st_slope, created_at";

#[async_trait]
impl HealthRecordRepository for SqlxHealthRecordRepository {
    async fn create(&self, record: &HealthRecord) -> Result<HealthRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO health_records
                (user_id, age, sex, chest_pain_type, resting_bp, cholesterol,
                 fasting_bs, resting_ecg, max_hr, exercise_angina, oldpeak, st_slope, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.age)
        .bind(record.sex.code())
        .bind(record.chest_pain_type.code())
        .bind(record.resting_bp)
        .bind(record.cholesterol)
        .bind(record.fasting_bs)
        .bind(record.resting_ecg.code())
        .bind(record.max_hr)
        .bind(record.exercise_angina)
        .bind(record.oldpeak)
        .bind(record.st_slope.code())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create health record")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Health record not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HealthRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM health_records WHERE id = ?",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get health record")?;

        row.map(|r| row_to_record(&r)).transpose()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<HealthRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM health_records WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            RECORD_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list health records")?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<HealthRecord> {
    Ok(HealthRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        age: row.get("age"),
        sex: Sex::from_code(row.get("sex")).context("Invalid sex code in database")?,
        chest_pain_type: ChestPainType::from_code(row.get("chest_pain_type"))
            .context("Invalid chest pain code in database")?,
        resting_bp: row.get("resting_bp"),
        cholesterol: row.get("cholesterol"),
        fasting_bs: row.get("fasting_bs"),
        resting_ecg: RestingEcg::from_code(row.get("resting_ecg"))
            .context("Invalid resting ECG code in database")?,
        max_hr: row.get("max_hr"),
        exercise_angina: row.get("exercise_angina"),
        oldpeak: row.get("oldpeak"),
        st_slope: StSlope::from_code(row.get("st_slope"))
            .context("Invalid ST slope code in database")?,
        created_at: row.get("created_at"),
    })
}
