//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`. Routes are grouped by the role
//! required to reach them:
//! - public: registration and login
//! - protected: everything a logged-in patient uses
//! - doctor: the appointment decision workflow
//! - admin: clinic-wide dashboards and maintenance

pub mod admin;
pub mod appointments;
pub mod assessments;
pub mod auth;
pub mod consultations;
pub mod dashboard;
pub mod doctor;
pub mod middleware;
pub mod notifications;
pub mod responses;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, RequestStats};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Doctor routes (need doctor or admin role)
    let doctor_routes = Router::new()
        .nest("/doctor", doctor::router())
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but no particular role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/dashboard", dashboard::router())
        .nest("/assessments", assessments::router().merge(consultations::router()))
        .nest("/appointments", appointments::router())
        .nest("/notifications", notifications::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
        .merge(doctor_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router> {
    // CORS must allow credentials so the session cookie travels with
    // cross-origin requests from the frontend
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::config::{Config, ModelConfig};
    use crate::db::repositories::{
        SqlxAppointmentRepository, SqlxConsultationRepository, SqlxHealthRecordRepository,
        SqlxNotificationRepository, SqlxPredictionRepository, SqlxSessionRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::ml::RiskModel;
    use crate::models::{User, UserRole};
    use crate::services::{
        password, AppointmentService, AssessmentService, ConsultationService, EmailService,
        LoginRateLimiter, NotificationService, UserService,
    };

    async fn test_server() -> (TestServer, AppState) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let config = Arc::new(Config::default());
        let model = Arc::new(
            RiskModel::train(&ModelConfig {
                samples: 400,
                seed: 42,
                learning_rate: 0.1,
                epochs: 200,
            })
            .unwrap(),
        );

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let record_repo = SqlxHealthRecordRepository::boxed(pool.clone());
        let prediction_repo = SqlxPredictionRepository::boxed(pool.clone());
        let appointment_repo = SqlxAppointmentRepository::boxed(pool.clone());
        let notification_repo = SqlxNotificationRepository::boxed(pool.clone());
        let consultation_repo = SqlxConsultationRepository::boxed(pool.clone());

        let email = Arc::new(EmailService::new(config.smtp.clone()));

        let state = AppState {
            config: config.clone(),
            user_service: Arc::new(UserService::new(user_repo.clone(), session_repo.clone())),
            assessment_service: Arc::new(AssessmentService::new(
                record_repo.clone(),
                prediction_repo.clone(),
                notification_repo.clone(),
                model.clone(),
            )),
            appointment_service: Arc::new(AppointmentService::new(
                appointment_repo.clone(),
                prediction_repo.clone(),
                notification_repo.clone(),
                user_repo.clone(),
                email,
            )),
            notification_service: Arc::new(NotificationService::new(notification_repo.clone())),
            consultation_service: Arc::new(ConsultationService::new(
                consultation_repo,
                prediction_repo.clone(),
            )),
            user_repo,
            prediction_repo,
            appointment_repo,
            model,
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
        };

        let app = build_router(state.clone(), "http://localhost:3000").unwrap();
        (TestServer::new(app).unwrap(), state)
    }

    async fn seed_staff(state: &AppState, username: &str, role: UserRole) -> i64 {
        let user = User::new(
            username.to_string(),
            format!("{}@clinic.example", username),
            password::hash_password("secret123").unwrap(),
            "Staff".to_string(),
            "Member".to_string(),
            None,
            role,
        );
        state.user_repo.create(&user).await.unwrap().id
    }

    /// Register a patient and return the session token and user id from the
    /// registration response itself.
    async fn register(server: &TestServer, username: &str) -> (String, i64) {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "secret123",
                "first_name": "Jane",
                "last_name": "Doe"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body: Value = response.json();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    async fn login(server: &TestServer, identity: &str) -> String {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "identity": identity, "password": "secret123" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: Value = response.json();
        body["token"].as_str().unwrap().to_string()
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    fn high_risk_measurements() -> Value {
        json!({
            "age": 68,
            "sex": "male",
            "chest_pain_type": "asymptomatic",
            "resting_bp": 170,
            "cholesterol": 310,
            "fasting_bs": true,
            "resting_ecg": "lv-hypertrophy",
            "max_hr": 92,
            "exercise_angina": true,
            "oldpeak": 3.2,
            "st_slope": "downsloping"
        })
    }

    #[tokio::test]
    async fn test_register_login_and_assess() {
        let (server, _state) = test_server().await;
        let (token, _) = register(&server, "janedoe").await;

        // the registration session works as-is, no login round-trip needed
        let response = server
            .get("/api/v1/auth/me")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["username"], "janedoe");

        // a fresh login works too
        let token = login(&server, "janedoe").await;

        let response = server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&high_risk_measurements())
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["prediction"]["risk_level"], "high");
        assert!(!body["explanations"].as_array().unwrap().is_empty());

        let response = server
            .get("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

        // high-risk assessments leave an unread notification behind
        let response = server
            .get("/api/v1/notifications/unread-count")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.json::<Value>()["unread"], 1);
    }

    #[tokio::test]
    async fn test_assessment_validation_rejected() {
        let (server, _state) = test_server().await;
        let (token, _) = register(&server, "janedoe").await;

        let mut body = high_risk_measurements();
        body["age"] = json!(200);

        let response = server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_booking_and_doctor_decision() {
        let (server, state) = test_server().await;
        seed_staff(&state, "drmiller", UserRole::Doctor).await;
        let (patient_token, _) = register(&server, "janedoe").await;

        let response = server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .json(&high_risk_measurements())
            .await;
        let prediction_id = response.json::<Value>()["prediction"]["id"].as_i64().unwrap();

        let date = (Utc::now().date_naive() + Duration::days(7)).to_string();
        let response = server
            .post("/api/v1/appointments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .json(&json!({
                "prediction_id": prediction_id,
                "doctor_name": "Staff Member",
                "scheduled_date": date,
                "scheduled_time": "09:00",
                "reason": "Follow-up on a high risk assessment"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let appointment_id = response.json::<Value>()["id"].as_i64().unwrap();

        // a second booking while one is still pending is refused
        let response = server
            .post("/api/v1/appointments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .json(&json!({
                "prediction_id": prediction_id,
                "doctor_name": "Staff Member",
                "scheduled_date": date,
                "scheduled_time": "09:30",
                "reason": "Second booking for the same patient"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        let doctor_token = login(&server, "drmiller").await;
        let response = server
            .post(&format!("/api/v1/doctor/appointments/{}/confirm", appointment_id))
            .add_header(header::AUTHORIZATION, bearer(&doctor_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "confirmed");

        // the patient gets a confirmation notification
        let response = server
            .get("/api/v1/notifications")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .await;
        let notifications = response.json::<Value>();
        assert!(notifications
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["kind"] == "appointment-confirmed"));
    }

    #[tokio::test]
    async fn test_role_boundaries() {
        let (server, state) = test_server().await;
        seed_staff(&state, "drmiller", UserRole::Doctor).await;
        let (patient_token, _) = register(&server, "janedoe").await;
        let doctor_token = login(&server, "drmiller").await;

        // no token at all
        let response = server.get("/api/v1/assessments").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        // patients cannot reach staff or admin endpoints
        let response = server
            .get("/api/v1/doctor/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        let response = server
            .get("/api/v1/admin/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        // doctors are staff but not admins
        let response = server
            .get("/api/v1/doctor/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&doctor_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = server
            .get("/api/v1/admin/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&doctor_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_dashboard_counts() {
        let (server, state) = test_server().await;
        seed_staff(&state, "admin", UserRole::Admin).await;
        register(&server, "janedoe").await;
        let admin_token = login(&server, "admin").await;

        let response = server
            .get("/api/v1/admin/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: Value = response.json();
        assert_eq!(body["patients"], 1);
        assert_eq!(body["total_users"], 2);
        assert_eq!(body["recent_registrations"].as_array().unwrap().len(), 2);

        let response = server
            .get("/api/v1/admin/system")
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["table_counts"]["users"], 2);
        assert_eq!(body["table_counts"]["predictions"], 0);

        let response = server
            .post("/api/v1/admin/system/clear-notifications")
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_user_management() {
        let (server, state) = test_server().await;
        let admin_id = seed_staff(&state, "admin", UserRole::Admin).await;
        let (patient_token, patient_id) = register(&server, "janedoe").await;
        let admin_token = login(&server, "admin").await;

        // grant the doctor role
        let response = server
            .put(&format!("/api/v1/admin/users/{}/role", patient_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "role": "doctor" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["role"], "doctor");

        // an unknown role is refused
        let response = server
            .put(&format!("/api/v1/admin/users/{}/role", patient_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "role": "nurse" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        // admins cannot change their own role or delete themselves
        let response = server
            .put(&format!("/api/v1/admin/users/{}/role", admin_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "role": "patient" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        let response = server
            .delete(&format!("/api/v1/admin/users/{}", admin_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        // deleting the account also kills its sessions
        let response = server
            .delete(&format!("/api/v1/admin/users/{}", patient_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server
            .get("/api/v1/auth/me")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .delete(&format!("/api/v1/admin/users/{}", patient_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_record_deletion() {
        let (server, state) = test_server().await;
        seed_staff(&state, "admin", UserRole::Admin).await;
        let (patient_token, _) = register(&server, "janedoe").await;
        let admin_token = login(&server, "admin").await;

        let response = server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .json(&high_risk_measurements())
            .await;
        let prediction_id = response.json::<Value>()["prediction"]["id"].as_i64().unwrap();

        let date = (Utc::now().date_naive() + Duration::days(7)).to_string();
        let response = server
            .post("/api/v1/appointments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .json(&json!({
                "prediction_id": prediction_id,
                "doctor_name": "Staff Member",
                "scheduled_date": date,
                "scheduled_time": "09:00",
                "reason": "Follow-up on a high risk assessment"
            }))
            .await;
        let appointment_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/api/v1/admin/appointments/{}", appointment_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server
            .delete(&format!("/api/v1/admin/predictions/{}", prediction_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server
            .get("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&patient_token))
            .await;
        assert!(response.json::<Value>().as_array().unwrap().is_empty());

        let response = server
            .delete(&format!("/api/v1/admin/predictions/{}", prediction_id))
            .add_header(header::AUTHORIZATION, bearer(&admin_token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_consultations_attached_to_assessment() {
        let (server, _state) = test_server().await;
        let (token, _) = register(&server, "janedoe").await;

        let response = server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&high_risk_measurements())
            .await;
        let prediction_id = response.json::<Value>()["prediction"]["id"].as_i64().unwrap();

        let response = server
            .post(&format!("/api/v1/assessments/{}/consultations", prediction_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "question": "What diet should I follow?" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert!(response.json::<Value>()["answer"]
            .as_str()
            .unwrap()
            .contains("heart-healthy"));

        // too short to answer
        let response = server
            .post(&format!("/api/v1/assessments/{}/consultations", prediction_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "question": "Why?" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/assessments/{}/consultations", prediction_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patient_dashboard_summary() {
        let (server, _state) = test_server().await;
        let (token, _) = register(&server, "janedoe").await;

        server
            .post("/api/v1/assessments")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&high_risk_measurements())
            .await;

        let response = server
            .get("/api/v1/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: Value = response.json();
        assert_eq!(body["total_assessments"], 1);
        assert_eq!(body["high_risk_assessments"], 1);
        assert_eq!(body["latest_prediction"]["risk_level"], "high");
        assert_eq!(body["recent_predictions"].as_array().unwrap().len(), 1);
        assert!(body["upcoming_appointments"].as_array().unwrap().is_empty());
        // the high-risk notification shows up unread
        assert_eq!(body["recent_notifications"].as_array().unwrap().len(), 1);
        assert_eq!(body["unread_notifications"], 1);
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (server, _state) = test_server().await;
        let (token, _) = register(&server, "janedoe").await;

        let response = server
            .post("/api/v1/auth/logout")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server
            .get("/api/v1/auth/me")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
