//! Schema bootstrap
//!
//! The `users` table is normally pre-existing. Creating it when absent keeps
//! a fresh checkout and the in-memory test databases usable; there is no
//! version tracking.

use anyhow::{Context, Result};

use super::SqliteDatabase;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        password TEXT NOT NULL,
        create_time TEXT NOT NULL
    )
"#;

/// Create the `users` table if it does not exist yet
pub async fn ensure_schema(db: &SqliteDatabase) -> Result<()> {
    db.execute(CREATE_USERS)
        .await
        .context("Failed to create users table")?;
    Ok(())
}
