//! User model
//!
//! The `users` table is the only persisted entity. Passwords are kept as
//! submitted; the listing endpoint returns them unchanged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Format of the `create_time` column (local time, sorts lexicographically)
pub const CREATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored user row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier assigned by the database
    pub id: i64,
    pub name: String,
    pub password: String,
    /// Local time of insertion, see [`CREATE_TIME_FORMAT`]
    pub create_time: String,
}

/// Validated input for inserting a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub password: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }
}

/// Name/password pair as received from a query string or request body.
///
/// Either field may be absent; callers decide whether that is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            password: Some(password.into()),
        }
    }
}

/// Outcome of an insert statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertionResult {
    /// Number of rows written
    pub changes: u64,
    /// Identifier assigned to the new row
    pub last_insert_rowid: i64,
}

/// Render a timestamp the way it is stored in `create_time`
pub fn format_create_time(at: DateTime<Local>) -> String {
    at.format(CREATE_TIME_FORMAT).to_string()
}
