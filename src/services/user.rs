//! User service
//!
//! Business rules around the `users` table:
//! - inserting requires a non-empty name and password
//! - listing returns every row
//! - login identity is either taken as submitted or checked against storage

use crate::db::repositories::UserRepository;
use crate::models::{Credentials, InsertionResult, NewUser, User};
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Validation error (missing or empty input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Credentials did not match a stored user
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Storage read or write failed
    #[error("Storage error: {0}")]
    StorageError(#[from] anyhow::Error),
}

/// User service for registration, listing and login identity
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    verify_credentials: bool,
}

impl UserService {
    /// Create a user service; `verify` decides whether login credentials
    /// are checked against storage
    pub fn with_credential_check(user_repo: Arc<dyn UserRepository>, verify: bool) -> Self {
        Self {
            user_repo,
            verify_credentials: verify,
        }
    }

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if name or password is missing or empty
    /// - `StorageError` if the insert fails
    pub async fn add_user(
        &self,
        credentials: Credentials,
    ) -> Result<InsertionResult, UserServiceError> {
        let user = require_credentials(credentials)?;
        let result = self.user_repo.add_user(&user).await?;

        tracing::debug!(id = result.last_insert_rowid, name = %user.name, "user added");
        Ok(result)
    }

    /// All stored users.
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list_users().await?)
    }

    /// Resolve the identity a session token is issued for.
    ///
    /// Without credential checking the submitted values are returned as-is,
    /// even when absent. With checking enabled both fields are required and
    /// must match a stored user.
    pub async fn login_identity(
        &self,
        credentials: Credentials,
    ) -> Result<Credentials, UserServiceError> {
        if !self.verify_credentials {
            return Ok(credentials);
        }

        let user = require_credentials(credentials)?;
        match self
            .user_repo
            .find_by_credentials(&user.name, &user.password)
            .await?
        {
            Some(found) => Ok(Credentials::new(found.name, found.password)),
            None => Err(UserServiceError::AuthenticationError(
                "Invalid name or password".to_string(),
            )),
        }
    }
}

fn require_credentials(credentials: Credentials) -> Result<NewUser, UserServiceError> {
    let name = require_field(credentials.name, "name")?;
    let password = require_field(credentials.password, "password")?;
    Ok(NewUser { name, password })
}

fn require_field(value: Option<String>, field: &str) -> Result<String, UserServiceError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(UserServiceError::ValidationError(format!(
            "{} must not be empty",
            field
        ))),
        None => Err(UserServiceError::ValidationError(format!(
            "{} is required",
            field
        ))),
    }
}
