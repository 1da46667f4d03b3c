#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use tower::ServiceExt;

use userbase::api::{build_router, AppState};
use userbase::config::{Config, Environment};
use userbase::db::repositories::{SqlxUserRepository, UserRepository};
use userbase::db::{create_test_pool, schema, DynDatabase};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Configuration with a known secret and a public dir that does not exist.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.secret = Some(TEST_SECRET.to_string());
    config.server.public_dir = "does-not-exist-public".into();
    config.environment = Environment::Development;
    config
}

/// Fresh in-memory database with the `users` table.
pub async fn test_db() -> DynDatabase {
    let db = create_test_pool().await.expect("Failed to create test pool");
    schema::ensure_schema(&db)
        .await
        .expect("Failed to create schema");
    db
}

/// Full router over a fresh in-memory database.
pub async fn build_test_app(config: Config) -> Router {
    let db = test_db().await;
    build_app_with_repo(config, SqlxUserRepository::boxed(db))
}

pub fn build_app_with_repo(config: Config, repo: Arc<dyn UserRepository>) -> Router {
    let state = AppState::new(config, repo).expect("Failed to build state");
    build_router(state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("Router is infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post(app: &Router, uri: &str, content_type: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("Body is not UTF-8")
}

/// `name=value` part of the first `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header missing")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Log in and return the cookie to send back.
pub async fn login(app: &Router, name: &str, password: &str) -> String {
    let response = get(
        app,
        &format!("/user/login?name={}&password={}", name, password),
    )
    .await;
    assert!(response.status().is_success());
    session_cookie(&response)
}
