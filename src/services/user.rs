//! User service
//!
//! Registration, login/logout, session validation and password changes.
//! Self-service registration always creates patient accounts; doctor and
//! admin accounts are provisioned by an administrator.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials, rate limited)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration input.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login input. `identity` accepts a username or an email address.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    pub identity: String,
    pub password: String,
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    /// Register a new patient account and log it straight in, so clients
    /// do not have to follow up with a login request.
    pub async fn register(&self, input: RegisterInput) -> Result<(User, Session), UserServiceError> {
        validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "username '{}' is taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User {
            id: 0,
            username: input.username,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            role: UserRole::Patient,
            created_at: Utc::now(),
        };

        let user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        let session = self.open_session(&user).await?;

        Ok((user, session))
    }

    /// Log in with username or email, returning a fresh session.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let user = self
            .find_by_identity(&input.identity)
            .await?
            .ok_or_else(invalid_credentials)?;

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(invalid_credentials());
        }

        let session = self.open_session(&user).await?;
        Ok((user, session))
    }

    async fn open_session(&self, user: &User) -> Result<Session, UserServiceError> {
        let session = Session::issue(user.id);
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(session)
    }

    /// Delete a session. Unknown tokens are ignored.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user, rejecting expired sessions.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get(token)
            .await
            .context("Failed to look up session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to load session user")?)
    }

    /// Change a user's password and invalidate their other sessions.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let valid = verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        if new_password.len() < 6 {
            return Err(UserServiceError::ValidationError(
                "New password must be at least 6 characters".to_string(),
            ));
        }

        let mut updated = user.clone();
        updated.password_hash = hash_password(new_password)?;
        self.user_repo
            .update(&updated)
            .await
            .context("Failed to update password")?;

        self.session_repo
            .delete_for_user(user.id)
            .await
            .context("Failed to invalidate sessions")?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?)
    }

    /// Delete expired sessions, returning the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to clean up sessions")?)
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, UserServiceError> {
        if identity.contains('@') {
            Ok(self
                .user_repo
                .get_by_email(identity)
                .await
                .context("Failed to look up user by email")?)
        } else {
            Ok(self
                .user_repo
                .get_by_username(identity)
                .await
                .context("Failed to look up user by username")?)
        }
    }
}

fn invalid_credentials() -> UserServiceError {
    UserServiceError::AuthenticationError("Invalid username or password".to_string())
}

fn validate_register_input(input: &RegisterInput) -> Result<(), UserServiceError> {
    let username = input.username.trim();
    if username.len() < 4 || username.len() > 20 {
        return Err(UserServiceError::ValidationError(
            "Username must be between 4 and 20 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(UserServiceError::ValidationError(
            "Username may only contain letters, digits and underscores".to_string(),
        ));
    }
    if !input.email.contains('@') {
        return Err(UserServiceError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }
    if input.password.len() < 6 {
        return Err(UserServiceError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(UserServiceError::ValidationError(
            "First and last name are required".to_string(),
        ));
    }
    Ok(())
}
