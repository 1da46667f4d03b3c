//! Database layer
//!
//! A single SQLite file holds the `users` table. The handle is opened once
//! at startup and shared through the application state.
//!
//! # Usage
//!
//! ```ignore
//! use userbase::config::DatabaseConfig;
//! use userbase::db::{create_pool, schema};
//!
//! let db = create_pool(&DatabaseConfig::default()).await?;
//! schema::ensure_schema(&db).await?;
//! db.ping().await?;
//! ```

pub mod pool;
pub mod repositories;
pub mod schema;

pub use pool::{create_pool, create_test_pool, DynDatabase, SqliteDatabase};
