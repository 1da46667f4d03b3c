//! Demo and health endpoints
//!
//! - GET / - descriptive JSON payload
//! - GET /string - plain-text payload

use axum::{routing::get, Json, Router};

use crate::api::middleware::AppState;
use crate::api::responses::TitleResponse;

/// Build the index router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/string", get(string))
}

/// GET / - Service description
async fn index() -> Json<TitleResponse> {
    Json(TitleResponse {
        title: "userbase json".to_string(),
    })
}

/// GET /string - Plain text
async fn string() -> &'static str {
    "userbase string"
}
