//! Integration tests for the middleware pipeline: CORS, authentication,
//! error formatting, static files and body limits.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;

use common::{
    body_bytes, body_json, body_text, build_app_with_repo, build_test_app, get, get_with_cookie,
    login, post, send, test_config, TEST_SECRET,
};
use userbase::config::Environment;
use userbase::db::repositories::UserRepository;
use userbase::models::{InsertionResult, NewUser, User};
use userbase::services::{Claims, TokenService};

/// Repository that counts calls and optionally fails every one of them.
#[derive(Default)]
struct CountingRepository {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingRepository {
    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn hit(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("database is locked");
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for CountingRepository {
    async fn add_user(&self, _user: &NewUser) -> Result<InsertionResult> {
        self.hit()?;
        Ok(InsertionResult {
            changes: 1,
            last_insert_rowid: 1,
        })
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.hit()?;
        Ok(Vec::new())
    }

    async fn find_by_credentials(&self, _name: &str, _password: &str) -> Result<Option<User>> {
        self.hit()?;
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn options_short_circuits_with_204() {
    let repo = Arc::new(CountingRepository::default());
    let app = build_app_with_repo(test_config(), repo.clone());

    for uri in ["/", "/user", "/user/addUser?name=a&password=b", "/nowhere"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{}", uri);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert!(body_bytes(response).await.is_empty());
    }

    assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cors_headers_echo_origin() {
    let app = build_test_app(test_config()).await;
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example.com"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, POST, OPTIONS"
    );
}

#[tokio::test]
async fn cors_headers_present_on_errors() {
    let app = build_test_app(test_config()).await;
    let request = Request::builder()
        .uri("/user")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_without_cookie_is_401_and_skips_storage() {
    let repo = Arc::new(CountingRepository::default());
    let app = build_app_with_repo(test_config(), repo.clone());

    let response = get(&app, "/user").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], 401);
    assert_eq!(json["message"], "Missing authentication token");
    assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn list_with_malformed_token_is_401() {
    let repo = Arc::new(CountingRepository::default());
    let app = build_app_with_repo(test_config(), repo.clone());

    let response = get_with_cookie(&app, "/user", "token=garbage").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn list_with_expired_token_is_401() {
    let repo = Arc::new(CountingRepository::default());
    let app = build_app_with_repo(test_config(), repo.clone());

    let now = Utc::now().timestamp();
    let token = TokenService::new(TEST_SECRET, 60)
        .sign(&Claims {
            name: Some("alice".to_string()),
            password: Some("p1".to_string()),
            iat: now - 20,
            exp: now - 10,
        })
        .unwrap();

    let response = get_with_cookie(&app, "/user", &format!("token={}", token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Token expired");
    assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn list_with_token_from_other_secret_is_401() {
    let app = build_test_app(test_config()).await;

    let token = TokenService::new("some-other-secret", 60)
        .issue(&userbase::models::Credentials::new("alice", "p1"))
        .unwrap();
    let response = get_with_cookie(&app, "/user", &format!("token={}", token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = build_test_app(test_config()).await;
    let cookie = login(&app, "alice", "p1").await;
    let token = cookie.trim_start_matches("token=");

    let request = Request::builder()
        .uri("/user")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Error formatting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn storage_failure_includes_detail_outside_production() {
    let repo = Arc::new(CountingRepository::failing());
    let app = build_app_with_repo(test_config(), repo);

    let response = get(&app, "/user/addUser?name=alice&password=p1").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], 500);
    assert_eq!(json["message"], "Storage error");
    assert!(json["result"].as_str().unwrap().contains("database is locked"));
}

#[tokio::test]
async fn storage_failure_hides_detail_in_production() {
    let mut config = test_config();
    config.environment = Environment::Production;
    let repo = Arc::new(CountingRepository::failing());
    let app = build_app_with_repo(config, repo);

    let response = get(&app, "/user/addUser?name=alice&password=p1").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], 500);
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn list_storage_failure_after_auth() {
    let repo = Arc::new(CountingRepository::failing());
    let app = build_app_with_repo(test_config(), repo.clone());

    let cookie = login(&app, "alice", "p1").await;
    let response = get_with_cookie(&app, "/user", &cookie).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn static_files_served_before_routes() {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("hello.txt"), "hello from disk").unwrap();
    std::fs::write(public.path().join("index.html"), "<h1>index</h1>").unwrap();

    let mut config = test_config();
    config.server.public_dir = public.path().to_path_buf();
    let app = build_test_app(config).await;

    let response = get(&app, "/hello.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hello from disk");

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "<h1>index</h1>");

    let response = get(&app, "/string").await;
    assert_eq!(body_text(response).await, "userbase string");
}

#[tokio::test]
async fn missing_public_dir_falls_through() {
    let app = build_test_app(test_config()).await;

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["title"].is_string());
}

// ---------------------------------------------------------------------------
// Body limit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = test_config();
    config.server.body_limit = 16;
    let app = build_test_app(config).await;

    let body = format!(r#"{{"name":"{}","password":"p1"}}"#, "a".repeat(64));
    let response = post(&app, "/user/addUser", "application/json", &body).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["code"], 413);
}
