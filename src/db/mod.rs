//! Database layer
//!
//! SQLite persistence for CardioGuard. The clinic deployment model is a
//! single binary with a file-backed SQLite database, so the pool is a plain
//! `sqlx::SqlitePool` with foreign keys enabled.
//!
//! # Usage
//!
//! ```ignore
//! use cardioguard::config::DatabaseConfig;
//! use cardioguard::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
