//! Consultation repository

use crate::models::Consultation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Consultation repository trait
#[async_trait]
pub trait ConsultationRepository: Send + Sync {
    /// Persist a question and its answer
    async fn create(&self, consultation: &Consultation) -> Result<Consultation>;

    /// List the consultations attached to one prediction, newest first
    async fn list_for_prediction(&self, prediction_id: i64) -> Result<Vec<Consultation>>;
}

/// SQLx-based consultation repository implementation
pub struct SqlxConsultationRepository {
    pool: SqlitePool,
}

impl SqlxConsultationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ConsultationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ConsultationRepository for SqlxConsultationRepository {
    async fn create(&self, consultation: &Consultation) -> Result<Consultation> {
        let result = sqlx::query(
            r#"
            INSERT INTO consultations (user_id, prediction_id, question, answer, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(consultation.user_id)
        .bind(consultation.prediction_id)
        .bind(&consultation.question)
        .bind(&consultation.answer)
        .bind(consultation.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create consultation")?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(
            "SELECT id, user_id, prediction_id, question, answer, created_at FROM consultations WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to reload consultation")?;

        Ok(row_to_consultation(&row))
    }

    async fn list_for_prediction(&self, prediction_id: i64) -> Result<Vec<Consultation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, prediction_id, question, answer, created_at
            FROM consultations
            WHERE prediction_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(prediction_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list consultations")?;

        Ok(rows.iter().map(row_to_consultation).collect())
    }
}

fn row_to_consultation(row: &sqlx::sqlite::SqliteRow) -> Consultation {
    Consultation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        prediction_id: row.get("prediction_id"),
        question: row.get("question"),
        answer: row.get("answer"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_prediction, seed_record, seed_user};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{RiskLevel, UserRole};
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let user_id = seed_user(&pool, "alice", UserRole::Patient).await;
        let record_id = seed_record(&pool, user_id).await;
        let prediction_id = seed_prediction(&pool, user_id, record_id, RiskLevel::Medium).await;

        let repo = SqlxConsultationRepository::new(pool);
        let created = repo
            .create(&Consultation {
                id: 0,
                user_id,
                prediction_id,
                question: "What does my result mean?".to_string(),
                answer: "Your assessment indicates a moderate risk.".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(created.id > 0);

        let listed = repo.list_for_prediction(prediction_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question, "What does my result mean?");

        assert!(repo.list_for_prediction(prediction_id + 1).await.unwrap().is_empty());
    }
}
