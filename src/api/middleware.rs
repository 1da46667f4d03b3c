//! API middleware
//!
//! Contains the request pipeline stages:
//! - CORS (origin echo, preflight short-circuit)
//! - Error boundary (uniform `{code, message, result}` bodies, failure logging)
//! - Authentication (session token validation)
//! - Request timing and logging

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::repositories::UserRepository;
use crate::services::{Claims, TokenError, TokenService, UserService, UserServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub token_service: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services around a user repository.
    ///
    /// Fails when the configuration carries no signing secret.
    pub fn new(config: Config, user_repo: Arc<dyn UserRepository>) -> Result<Self, TokenError> {
        let token_service = TokenService::from_config(&config.auth)?;
        let user_service =
            UserService::with_credential_check(user_repo, config.auth.verify_credentials);

        Ok(Self {
            user_service: Arc::new(user_service),
            token_service: Arc::new(token_service),
            config: Arc::new(config),
        })
    }
}

/// Claims of the session token that authenticated the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

// ============================================================================
// Errors
// ============================================================================

/// Error returned by handlers and middleware.
///
/// The response carries the error itself as an extension so the error
/// boundary can log it and attach `detail` outside production.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn storage_error(error: &anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
            .with_detail(format!("{:#}", error))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn body(&self, include_detail: bool) -> ErrorBody {
        ErrorBody {
            code: self.status.as_u16(),
            message: self.message.clone(),
            result: if include_detail { self.detail.clone() } else { None },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body(false))).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::StorageError(err) => ApiError::storage_error(&err),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ApiError::unauthorized("Token expired"),
            TokenError::Invalid(reason) => {
                ApiError::unauthorized("Invalid token").with_detail(reason)
            }
            TokenError::MissingSecret | TokenError::Signing(_) => {
                ApiError::internal_error("Failed to issue token").with_detail(e.to_string())
            }
        }
    }
}

/// Turn a caught panic into a 500 error response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    ApiError::internal_error("Internal Server Error")
        .with_detail(detail)
        .into_response()
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

/// Fallback for a known path requested with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Error boundary middleware
///
/// Logs every error response and, outside production, rewrites the body to
/// include the diagnostic detail as `result`.
pub async fn error_boundary(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let Some(error) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };

    let detail = error.detail.as_deref().unwrap_or("");
    if error.status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = error.status.as_u16(),
            detail,
            "{} {} - {}",
            method,
            path,
            error.message
        );
    } else {
        tracing::warn!(
            method = %method,
            path = %path,
            status = error.status.as_u16(),
            "{} {} - {}",
            method,
            path,
            error.message
        );
    }

    if state.config.environment.is_production() || error.detail.is_none() {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    match serde_json::to_vec(&error.body(true)) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(_) => error.into_response(),
    }
}

// ============================================================================
// CORS
// ============================================================================

/// CORS middleware
///
/// Echoes the request origin with credentials allowed. `OPTIONS` requests
/// are answered with an empty 204 and never reach the inner stages.
pub async fn cors(request: Request, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );

    response
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract the session token from the `Authorization` header or the cookie
fn extract_session_token(request: &Request, cookie_name: &str) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    for cookie_header in request.headers().get_all(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    if name == cookie_name && !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request, &state.config.auth.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let claims = state.token_service.validate(&token)?;

    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

// ============================================================================
// Request logging
// ============================================================================

/// Request timing middleware
///
/// Emits one info line per request: `"{method} {uri} - {ms}ms"`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms,
        "{} {} - {}ms",
        method,
        uri,
        elapsed_ms
    );

    response
}

// ============================================================================
// Tests
// ============================================================================
