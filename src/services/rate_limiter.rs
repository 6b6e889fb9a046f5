//! Login rate limiter
//!
//! Brute force protection for the auth endpoints:
//! - failed attempts per username: 5 per 15 minutes
//! - login requests per IP: 10 per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_USERNAME_ATTEMPTS: usize = 5;
const USERNAME_WINDOW_MINUTES: i64 = 15;
const MAX_IP_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

/// In-memory login rate limiter.
pub struct LoginRateLimiter {
    username_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            username_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Whether further attempts for this username should be refused.
    pub async fn is_username_limited(&self, username: &str) -> bool {
        let mut attempts = self.username_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(USERNAME_WINDOW_MINUTES);

        let entry = attempts.entry(username.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= MAX_USERNAME_ATTEMPTS
    }

    /// Record a failed login attempt for a username.
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear a username's attempts after a successful login.
    pub async fn clear_username_attempts(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Whether further login requests from this IP should be refused.
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        let entry = attempts.entry(ip).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= MAX_IP_REQUESTS
    }

    /// Record a login request from an IP.
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop expired entries. Called periodically from a background task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let username_cutoff = now - Duration::minutes(USERNAME_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);

        {
            let mut attempts = self.username_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > username_cutoff);
                !times.is_empty()
            });
        }
        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_username_rate_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(!limiter.is_username_limited("alice").await);
            limiter.record_failed_attempt("alice").await;
        }

        limiter.record_failed_attempt("alice").await;
        assert!(limiter.is_username_limited("alice").await);

        // other usernames are unaffected
        assert!(!limiter.is_username_limited("bob").await);
    }

    #[tokio::test]
    async fn test_username_is_case_insensitive() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failed_attempt("Alice").await;
        }
        assert!(limiter.is_username_limited("alice").await);
    }

    #[tokio::test]
    async fn test_clear_on_successful_login() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failed_attempt("alice").await;
        }
        assert!(limiter.is_username_limited("alice").await);

        limiter.clear_username_attempts("alice").await;
        assert!(!limiter.is_username_limited("alice").await);
    }

    #[tokio::test]
    async fn test_ip_rate_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.1").unwrap();

        for _ in 0..10 {
            assert!(!limiter.is_ip_limited(ip).await);
            limiter.record_ip_request(ip).await;
        }
        assert!(limiter.is_ip_limited(ip).await);

        let other = IpAddr::from_str("10.0.0.2").unwrap();
        assert!(!limiter.is_ip_limited(other).await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("alice").await;
        limiter.cleanup().await;
        // recent attempts survive cleanup
        limiter.record_failed_attempt("alice").await;
        for _ in 0..3 {
            limiter.record_failed_attempt("alice").await;
        }
        assert!(limiter.is_username_limited("alice").await);
    }
}
