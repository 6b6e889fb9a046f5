//! CardioGuard - Heart-disease risk assessment and appointment backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardioguard::{
    api::{self, AppState, RequestStats},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAppointmentRepository, SqlxConsultationRepository, SqlxHealthRecordRepository,
            SqlxNotificationRepository, SqlxPredictionRepository, SqlxSessionRepository,
            SqlxUserRepository,
        },
    },
    ml::RiskModel,
    services::{
        AppointmentService, AssessmentService, ConsultationService, EmailService,
        LoginRateLimiter, NotificationService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardioguard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CardioGuard...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Train the risk classifier. Training is deterministic for a given seed
    // and takes well under a second, so the model is rebuilt on every start.
    let model = Arc::new(RiskModel::train(&config.model)?);

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let record_repo = SqlxHealthRecordRepository::boxed(pool.clone());
    let prediction_repo = SqlxPredictionRepository::boxed(pool.clone());
    let appointment_repo = SqlxAppointmentRepository::boxed(pool.clone());
    let notification_repo = SqlxNotificationRepository::boxed(pool.clone());
    let consultation_repo = SqlxConsultationRepository::boxed(pool.clone());

    // Initialize services
    let email = Arc::new(EmailService::new(config.smtp.clone()));
    if email.is_enabled() {
        tracing::info!(host = %config.smtp.host, "SMTP notifications enabled");
    }

    let user_service = Arc::new(UserService::new(user_repo.clone(), session_repo.clone()));
    let assessment_service = Arc::new(AssessmentService::new(
        record_repo,
        prediction_repo.clone(),
        notification_repo.clone(),
        model.clone(),
    ));
    let appointment_service = Arc::new(AppointmentService::new(
        appointment_repo.clone(),
        prediction_repo.clone(),
        notification_repo.clone(),
        user_repo.clone(),
        email,
    ));
    let notification_service = Arc::new(NotificationService::new(notification_repo));
    let consultation_service = Arc::new(ConsultationService::new(
        consultation_repo,
        prediction_repo.clone(),
    ));

    // Build application state
    let rate_limiter = Arc::new(LoginRateLimiter::new());
    let cors_origin = config.server.cors_origin.clone();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        user_service: user_service.clone(),
        assessment_service,
        appointment_service,
        notification_service,
        consultation_service,
        user_repo,
        prediction_repo,
        appointment_repo,
        model,
        rate_limiter: rate_limiter.clone(),
        request_stats: Arc::new(RequestStats::new()),
    };

    // Start rate limiter cleanup task (runs every 5 minutes)
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    // Start expired session cleanup task (runs hourly)
    {
        let users = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                if let Err(e) = users.cleanup_expired_sessions().await {
                    tracing::warn!(error = %e, "Session cleanup failed");
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &cors_origin)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
