//! Static file serving from the public directory
//!
//! Runs ahead of the API routes: an existing file under
//! `server.public_dir` wins over a route with the same path, anything else
//! falls through.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::api::middleware::AppState;

/// Static file middleware
pub async fn serve_static(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }

    let mut probe = Request::new(Body::empty());
    *probe.method_mut() = request.method().clone();
    *probe.uri_mut() = request.uri().clone();
    *probe.headers_mut() = request.headers().clone();

    let served = ServeDir::new(&state.config.server.public_dir)
        .oneshot(probe)
        .await;

    match served {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => {
            tracing::debug!(path = %request.uri().path(), "served static file");
            response.map(Body::new)
        }
        _ => next.run(request).await,
    }
}
