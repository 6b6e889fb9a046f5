//! Shared fixtures for repository tests.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{
    ChestPainType, HealthRecord, Prediction, RestingEcg, RiskLevel, Sex, StSlope, User, UserRole,
};

use super::health_record::{HealthRecordRepository, SqlxHealthRecordRepository};
use super::prediction::{PredictionRepository, SqlxPredictionRepository};
use super::user::{SqlxUserRepository, UserRepository};

pub(crate) async fn seed_user(pool: &SqlitePool, username: &str, role: UserRole) -> i64 {
    let users = SqlxUserRepository::new(pool.clone());
    users
        .create(&User {
            id: 0,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            role,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
        .id
}

pub(crate) fn sample_record(user_id: i64) -> HealthRecord {
    HealthRecord {
        id: 0,
        user_id,
        age: 54,
        sex: Sex::Male,
        chest_pain_type: ChestPainType::AtypicalAngina,
        resting_bp: 130,
        cholesterol: 246,
        fasting_bs: false,
        resting_ecg: RestingEcg::Normal,
        max_hr: 150,
        exercise_angina: false,
        oldpeak: 1.2,
        st_slope: StSlope::Flat,
        created_at: Utc::now(),
    }
}

pub(crate) async fn seed_record(pool: &SqlitePool, user_id: i64) -> i64 {
    let records = SqlxHealthRecordRepository::new(pool.clone());
    records.create(&sample_record(user_id)).await.unwrap().id
}

pub(crate) async fn seed_prediction(
    pool: &SqlitePool,
    user_id: i64,
    record_id: i64,
    risk: RiskLevel,
) -> i64 {
    let predictions = SqlxPredictionRepository::new(pool.clone());
    predictions
        .create(&Prediction {
            id: 0,
            user_id,
            health_record_id: record_id,
            positive: risk != RiskLevel::Low,
            confidence: 0.85,
            risk_level: risk,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
        .id
}
