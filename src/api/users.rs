//! User API endpoints
//!
//! - GET /user - List users (requires a session token)
//! - GET|POST /user/login - Issue a session token cookie
//! - GET|POST /user/addUser - Insert a user
//!
//! GET variants read `name` and `password` from the query string, POST
//! variants from a JSON or form body.

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};

use crate::api::body::{self, RequestBody};
use crate::api::middleware::{self, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::DataResponse;
use crate::models::{Credentials, InsertionResult, User};

/// Build the user router
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            get(list_users).route_layer(axum_middleware::from_fn_with_state(
                state,
                middleware::require_auth,
            )),
        )
        .route("/user/login", get(login_query).post(login_body))
        .route("/user/addUser", get(add_user_query).post(add_user_body))
}

fn query_credentials(RawQuery(query): RawQuery) -> Result<Credentials, ApiError> {
    let pairs = body::decode_pairs(query.as_deref().unwrap_or_default())?;
    Ok(body::credentials_from_pairs(pairs))
}

/// GET /user - List all users
async fn list_users(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
) -> Result<Json<DataResponse<Vec<User>>>, ApiError> {
    tracing::debug!(name = ?claims.name, exp = claims.exp, "listing users");

    let users = state.user_service.list_users().await?;
    Ok(Json(DataResponse::new(users)))
}

/// GET /user/login
async fn login_query(
    State(state): State<AppState>,
    query: RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    login(&state, query_credentials(query)?).await
}

/// POST /user/login
async fn login_body(
    State(state): State<AppState>,
    body: RequestBody,
) -> Result<impl IntoResponse, ApiError> {
    login(&state, body.credentials()?).await
}

/// Issue a session token for the submitted identity and set it as cookie.
///
/// Unless `auth.verify_credentials` is enabled the identity is not checked
/// against stored users.
async fn login(
    state: &AppState,
    credentials: Credentials,
) -> Result<(HeaderMap, Json<DataResponse<&'static str>>), ApiError> {
    let identity = state.user_service.login_identity(credentials).await?;
    let token = state.token_service.issue(&identity)?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.config.auth.cookie_name,
        token,
        state.token_service.ttl_seconds()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| {
            ApiError::internal_error("Failed to set cookie").with_detail(e.to_string())
        })?,
    );

    tracing::info!(name = ?identity.name, "session token issued");
    Ok((headers, Json(DataResponse::new("1"))))
}

/// GET /user/addUser
async fn add_user_query(
    State(state): State<AppState>,
    query: RawQuery,
) -> Result<Json<DataResponse<InsertionResult>>, ApiError> {
    add_user(&state, query_credentials(query)?).await
}

/// POST /user/addUser
async fn add_user_body(
    State(state): State<AppState>,
    body: RequestBody,
) -> Result<Json<DataResponse<InsertionResult>>, ApiError> {
    add_user(&state, body.credentials()?).await
}

async fn add_user(
    state: &AppState,
    credentials: Credentials,
) -> Result<Json<DataResponse<InsertionResult>>, ApiError> {
    let result = state.user_service.add_user(credentials).await?;
    Ok(Json(DataResponse::new(result)))
}
