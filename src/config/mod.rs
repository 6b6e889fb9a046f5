//! Configuration management
//!
//! This module handles loading and parsing configuration for CardioGuard.
//! Configuration is loaded from a config.yml file; missing values are filled
//! with sensible defaults, so an empty or absent file yields a working
//! development setup (SQLite in `data/`, no SMTP).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// SMTP configuration for appointment emails
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Risk model training configuration
    #[serde(default)]
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing file is not an error: defaults are used so the server can
    /// start with zero configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path (or sqlite: URL) of the SQLite database file
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Directory where admin-triggered backups are written
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            backup_dir: default_backup_dir(),
        }
    }
}

fn default_database_url() -> String {
    "data/cardioguard.db".to_string()
}

fn default_backup_dir() -> String {
    "backups".to_string()
}

/// SMTP configuration for outgoing appointment emails.
///
/// When `enabled` is false (the default) the email service logs the message
/// instead of sending it, so the appointment workflow never depends on a
/// mail server being reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// From address, e.g. "clinic@example.com"
    #[serde(default)]
    pub from: String,
    #[serde(default = "default_smtp_from_name")]
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
            from_name: default_smtp_from_name(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from_name() -> String {
    "CardioGuard".to_string()
}

/// Risk model training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of synthetic cohort samples to train on
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Seed for the synthetic cohort generator
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Gradient descent learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Gradient descent epochs
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: default_seed(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
        }
    }
}

fn default_samples() -> usize {
    1000
}

fn default_seed() -> u64 {
    42
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_epochs() -> usize {
    500
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/cardioguard.db");
        assert!(!config.smtp.enabled);
        assert_eq!(config.model.samples, 1000);
        assert_eq!(config.model.seed, 42);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("does-not-exist.yml")).expect("Should fall back");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(
            file,
            "server:\n  port: 9000\ndatabase:\n  url: /tmp/test.db"
        )
        .expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url, "/tmp/test.db");
        // Unspecified sections fall back to defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.smtp.enabled);
    }

    #[test]
    fn test_load_smtp_section() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(
            file,
            "smtp:\n  enabled: true\n  host: smtp.example.com\n  from: clinic@example.com"
        )
        .expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");
        assert!(config.smtp.enabled);
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "server: [not a map").expect("Failed to write config");

        assert!(Config::load(file.path()).is_err());
    }
}
