//! Prediction repository
//!
//! Stores classifier outputs. The admin listing joins users so the panel can
//! filter by risk level and search by patient.

use crate::models::{Prediction, RiskLevel};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// A prediction joined with the patient it belongs to, for admin listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PredictionWithUser {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub username: String,
    pub patient_name: String,
}

/// Prediction repository trait
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// Persist a new prediction
    async fn create(&self, prediction: &Prediction) -> Result<Prediction>;

    /// Get a prediction by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Prediction>>;

    /// List a user's predictions, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Prediction>>;

    /// Most recent prediction for a user
    async fn latest_for_user(&self, user_id: i64) -> Result<Option<Prediction>>;

    /// Count all predictions
    async fn count(&self) -> Result<i64>;

    /// Count predictions at a given risk level
    async fn count_by_risk(&self, risk: RiskLevel) -> Result<i64>;

    /// Admin listing with pagination, optional risk filter and patient search.
    async fn list(
        &self,
        page: i64,
        per_page: i64,
        risk: Option<RiskLevel>,
        search: Option<&str>,
    ) -> Result<(Vec<PredictionWithUser>, i64)>;

    /// Delete a prediction (admin maintenance); cascades to its
    /// appointments and consultations.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based prediction repository implementation
pub struct SqlxPredictionRepository {
    pool: SqlitePool,
}

impl SqlxPredictionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PredictionRepository> {
        Arc::new(Self::new(pool))
    }
}

const PREDICTION_COLUMNS: &str =
    "id, user_id, health_record_id, positive, confidence, risk_level, created_at";

#[async_trait]
impl PredictionRepository for SqlxPredictionRepository {
    async fn create(&self, prediction: &Prediction) -> Result<Prediction> {
        let result = sqlx::query(
            r#"
            INSERT INTO predictions
                (user_id, health_record_id, positive, confidence, risk_level, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prediction.user_id)
        .bind(prediction.health_record_id)
        .bind(prediction.positive)
        .bind(prediction.confidence)
        .bind(prediction.risk_level.to_string())
        .bind(prediction.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create prediction")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Prediction not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Prediction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE id = ?",
            PREDICTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get prediction")?;

        row.map(|r| row_to_prediction(&r)).transpose()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Prediction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            PREDICTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list predictions")?;

        rows.iter().map(row_to_prediction).collect()
    }

    async fn latest_for_user(&self, user_id: i64) -> Result<Option<Prediction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM predictions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
            PREDICTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest prediction")?;

        row.map(|r| row_to_prediction(&r)).transpose()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM predictions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count predictions")?;
        Ok(row.get("count"))
    }

    async fn count_by_risk(&self, risk: RiskLevel) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM predictions WHERE risk_level = ?")
            .bind(risk.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count predictions by risk")?;
        Ok(row.get("count"))
    }

    async fn list(
        &self,
        page: i64,
        per_page: i64,
        risk: Option<RiskLevel>,
        search: Option<&str>,
    ) -> Result<(Vec<PredictionWithUser>, i64)> {
        let offset = super::page_offset(page, per_page);

        // Filters are optional so the WHERE clause is assembled dynamically;
        // values are always bound, never interpolated.
        let mut conditions = Vec::new();
        if risk.is_some() {
            conditions.push("p.risk_level = ?");
        }
        if search.is_some() {
            conditions.push(
                "(u.username LIKE ? OR u.email LIKE ? OR u.first_name LIKE ? OR u.last_name LIKE ?)",
            );
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let risk_str = risk.map(|r| r.to_string());
        let pattern = search.map(|s| format!("%{}%", s));

        let list_sql = format!(
            r#"
            SELECT p.id, p.user_id, p.health_record_id, p.positive, p.confidence,
                   p.risk_level, p.created_at,
                   u.username, u.first_name, u.last_name
            FROM predictions p
            JOIN users u ON u.id = p.user_id
            {}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut query = sqlx::query(&list_sql);
        if let Some(risk) = &risk_str {
            query = query.bind(risk);
        }
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern).bind(pattern).bind(pattern);
        }
        let rows = query
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list predictions")?;

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM predictions p JOIN users u ON u.id = p.user_id {}",
            where_clause
        );
        let mut count_query = sqlx::query(&count_sql);
        if let Some(risk) = &risk_str {
            count_query = count_query.bind(risk);
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
            .context("Failed to count matching predictions")?
            .get("count");

        let mut items = Vec::new();
        for row in rows {
            let first_name: String = row.get("first_name");
            let last_name: String = row.get("last_name");
            items.push(PredictionWithUser {
                prediction: row_to_prediction(&row)?,
                username: row.get("username"),
                patient_name: format!("{} {}", first_name, last_name),
            });
        }

        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM predictions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete prediction")?;
        Ok(())
    }
}

fn row_to_prediction(row: &sqlx::sqlite::SqliteRow) -> Result<Prediction> {
    let risk_str: String = row.get("risk_level");
    let risk_level = RiskLevel::from_str(&risk_str)
        .with_context(|| format!("Invalid risk level in database: {}", risk_str))?;

    Ok(Prediction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        health_record_id: row.get("health_record_id"),
        positive: row.get("positive"),
        confidence: row.get("confidence"),
        risk_level,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_record, seed_user};
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;
    use chrono::Utc;

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let user_id = seed_user(&pool, "alice", UserRole::Patient).await;
        let record_id = seed_record(&pool, user_id).await;
        (pool, user_id, record_id)
    }

    fn sample_prediction(user_id: i64, record_id: i64, risk: RiskLevel) -> Prediction {
        Prediction {
            id: 0,
            user_id,
            health_record_id: record_id,
            positive: risk != RiskLevel::Low,
            confidence: 0.85,
            risk_level: risk,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_latest() {
        let (pool, user_id, record_id) = setup().await;
        let repo = SqlxPredictionRepository::new(pool);

        repo.create(&sample_prediction(user_id, record_id, RiskLevel::Low))
            .await
            .unwrap();
        let high = repo
            .create(&sample_prediction(user_id, record_id, RiskLevel::High))
            .await
            .unwrap();

        let latest = repo.latest_for_user(user_id).await.unwrap().unwrap();
        assert_eq!(latest.id, high.id);
        assert_eq!(latest.risk_level, RiskLevel::High);

        assert_eq!(repo.list_for_user(user_id).await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.count_by_risk(RiskLevel::High).await.unwrap(), 1);
        assert_eq!(repo.count_by_risk(RiskLevel::Medium).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admin_listing_filters() {
        let (pool, user_id, record_id) = setup().await;
        let repo = SqlxPredictionRepository::new(pool);

        repo.create(&sample_prediction(user_id, record_id, RiskLevel::Low))
            .await
            .unwrap();
        repo.create(&sample_prediction(user_id, record_id, RiskLevel::High))
            .await
            .unwrap();

        let (all, total) = repo.list(1, 20, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(total, 2);
        assert_eq!(all[0].username, "alice");
        assert_eq!(all[0].patient_name, "Ada Lovelace");

        let (high_only, total) = repo.list(1, 20, Some(RiskLevel::High), None).await.unwrap();
        assert_eq!(high_only.len(), 1);
        assert_eq!(total, 1);

        let (matched, _) = repo.list(1, 20, None, Some("ali")).await.unwrap();
        assert_eq!(matched.len(), 2);

        let (none, total) = repo.list(1, 20, None, Some("zzz")).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, user_id, record_id) = setup().await;
        let repo = SqlxPredictionRepository::new(pool);

        let prediction = repo
            .create(&sample_prediction(user_id, record_id, RiskLevel::High))
            .await
            .unwrap();

        repo.delete(prediction.id).await.unwrap();
        assert!(repo.get_by_id(prediction.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination() {
        let (pool, user_id, record_id) = setup().await;
        let repo = SqlxPredictionRepository::new(pool);

        for _ in 0..5 {
            repo.create(&sample_prediction(user_id, record_id, RiskLevel::Low))
                .await
                .unwrap();
        }

        let (page_one, total) = repo.list(1, 2, None, None).await.unwrap();
        assert_eq!(page_one.len(), 2);
        assert_eq!(total, 5);

        let (page_three, _) = repo.list(3, 2, None, None).await.unwrap();
        assert_eq!(page_three.len(), 1);
    }
}
