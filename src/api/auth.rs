//! Authentication endpoints
//!
//! Registration, login, logout, current user and password changes. Login
//! sets an httpOnly session cookie and also returns the token for clients
//! that prefer a Bearer header.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{MessageResponse, SessionResponse, UserResponse};
use crate::services::{LoginInput, RegisterInput};

const SESSION_COOKIE_MAX_AGE: i64 = crate::models::SESSION_TTL_DAYS * 24 * 60 * 60;

/// Routes that do not require authentication.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes behind the auth middleware.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/password", put(change_password))
}

/// POST /api/v1/auth/register - Create a patient account
///
/// The new account is logged in immediately: the response carries the
/// session cookie and token just like a login.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.user_service.register(body).await?;

    let response_headers = session_cookie_headers(&session.id)?;
    Ok((
        StatusCode::CREATED,
        response_headers,
        Json(SessionResponse {
            token: session.id,
            expires_at: session.expires_at.to_rfc3339(),
            user: UserResponse::from(&user),
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    identity: String,
    password: String,
}

/// POST /api/v1/auth/login - Log in with username or email
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // per-IP limit first, then per-username
    if let Some(ip) = extract_ip_address(&headers).and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::rate_limited(
                "Too many requests, please try again later",
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state.rate_limiter.is_username_limited(&body.identity).await {
        return Err(ApiError::rate_limited(
            "Too many failed attempts, please try again in 15 minutes",
        ));
    }

    let result = state
        .user_service
        .login(LoginInput {
            identity: body.identity.clone(),
            password: body.password,
        })
        .await;

    let (user, session) = match result {
        Ok(ok) => ok,
        Err(e) => {
            state.rate_limiter.record_failed_attempt(&body.identity).await;
            return Err(e.into());
        }
    };

    state
        .rate_limiter
        .clear_username_attempts(&body.identity)
        .await;

    let response_headers = session_cookie_headers(&session.id)?;

    Ok((
        response_headers,
        Json(SessionResponse {
            token: session.id,
            expires_at: session.expires_at.to_rfc3339(),
            user: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/logout - Invalidate the current session
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            s.split(';')
                .find(|c| c.trim().starts_with("session="))
                .map(|c| c.trim().strip_prefix("session=").unwrap_or(""))
        })
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(token).await?;

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Current user
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user.0))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

/// PUT /api/v1/auth/password - Change password
///
/// Invalidates every session of the user, including the current one.
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .change_password(&user.0, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(MessageResponse::new(
        "Password changed, please log in again",
    )))
}

/// Set-Cookie headers carrying the session token.
fn session_cookie_headers(session_id: &str) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session_id, SESSION_COOKIE_MAX_AGE
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie: {}", e)))?,
    );
    Ok(headers)
}

/// Client IP from proxy headers.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}
