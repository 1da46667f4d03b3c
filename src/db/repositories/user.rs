//! User repository
//!
//! Database operations for the `users` table.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait on SQLite

use crate::db::DynDatabase;
use crate::models::{format_create_time, InsertionResult, NewUser, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Append a user row stamped with the current local time
    async fn add_user(&self, user: &NewUser) -> Result<InsertionResult>;

    /// Every row in storage order
    async fn list_users(&self) -> Result<Vec<User>>;

    /// First user whose name and password both match
    async fn find_by_credentials(&self, name: &str, password: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    db: DynDatabase,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(db: DynDatabase) -> Self {
        Self { db }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: DynDatabase) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn add_user(&self, user: &NewUser) -> Result<InsertionResult> {
        add_user_sqlite(self.db.pool(), user).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        list_users_sqlite(self.db.pool()).await
    }

    async fn find_by_credentials(&self, name: &str, password: &str) -> Result<Option<User>> {
        find_by_credentials_sqlite(self.db.pool(), name, password).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn add_user_sqlite(pool: &SqlitePool, user: &NewUser) -> Result<InsertionResult> {
    let create_time = format_create_time(Local::now());

    let result = sqlx::query("INSERT INTO users (name, password, create_time) VALUES (?, ?, ?)")
        .bind(&user.name)
        .bind(&user.password)
        .bind(&create_time)
        .execute(pool)
        .await
        .context("Failed to insert user")?;

    Ok(InsertionResult {
        changes: result.rows_affected(),
        last_insert_rowid: result.last_insert_rowid(),
    })
}

async fn list_users_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT id, name, password, create_time FROM users")
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user).collect()
}

async fn find_by_credentials_sqlite(
    pool: &SqlitePool,
    name: &str,
    password: &str,
) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, password, create_time
        FROM users
        WHERE name = ? AND password = ?
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .context("Failed to look up user by credentials")?;

    row.as_ref().map(row_to_user).transpose()
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        password: row.try_get("password")?,
        create_time: row.try_get("create_time")?,
    })
}
