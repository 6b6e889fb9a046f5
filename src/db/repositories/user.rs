//! User repository
//!
//! Database operations for user accounts, including the admin listing with
//! its free-text search over username, email and names.

use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count all users
    async fn count(&self) -> Result<i64>;

    /// Count users with a given role
    async fn count_by_role(&self, role: UserRole) -> Result<i64>;

    /// List users with pagination and an optional search term matched
    /// against username, email, first name and last name.
    async fn list(
        &self,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<(Vec<User>, i64)>;

    /// List all users with a given role (for doctor pickers)
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, phone, role, created_at";

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let role_str = user.role.to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, phone, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&role_str)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by id")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by username")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by email")?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn update(&self, user: &User) -> Result<User> {
        let role_str = user.role.to_string();

        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, first_name = ?,
                last_name = ?, phone = ?, role = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&role_str)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;
        Ok(row.get("count"))
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE role = ?")
            .bind(role.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users by role")?;
        Ok(row.get("count"))
    }

    async fn list(
        &self,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<(Vec<User>, i64)> {
        let offset = super::page_offset(page, per_page);
        let pattern = search.map(|s| format!("%{}%", s));

        let (rows, total) = match &pattern {
            Some(pattern) => {
                let rows = sqlx::query(&format!(
                    r#"
                    SELECT {} FROM users
                    WHERE username LIKE ? OR email LIKE ? OR first_name LIKE ? OR last_name LIKE ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                    USER_COLUMNS
                ))
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .context("Failed to search users")?;

                let count_row = sqlx::query(
                    r#"
                    SELECT COUNT(*) as count FROM users
                    WHERE username LIKE ? OR email LIKE ? OR first_name LIKE ? OR last_name LIKE ?
                    "#,
                )
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .bind(pattern)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count matching users")?;

                (rows, count_row.get("count"))
            }
            None => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    USER_COLUMNS
                ))
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .context("Failed to list users")?;

                (rows, self.count().await?)
            }
        };

        let mut users = Vec::new();
        for row in rows {
            users.push(row_to_user(&row)?);
        }

        Ok((users, total))
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE role = ? ORDER BY last_name, first_name",
            USER_COLUMNS
        ))
        .bind(role.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users by role")?;

        rows.iter().map(row_to_user).collect()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone: row.get("phone"),
        role,
        created_at: row.get("created_at"),
    })
}
