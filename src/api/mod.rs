//! API layer - HTTP handlers and routing
//!
//! Routes:
//! - Index endpoints (`/`, `/string`)
//! - User endpoints (`/user`, `/user/login`, `/user/addUser`)
//!
//! Every request passes through, outermost first: CORS, the error boundary,
//! panic catching, the body size limit, static files, then request logging
//! around the route handler.

pub mod body;
pub mod index;
pub mod middleware;
pub mod responses;
pub mod static_files;
pub mod users;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the route table
pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(index::router())
        .merge(users::router(state))
        .fallback(middleware::not_found)
        .method_not_allowed_fallback(middleware::method_not_allowed)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit;

    build_api_router(state.clone())
        .layer(axum_middleware::from_fn(middleware::request_logging))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            static_files::serve_static,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_boundary,
        ))
        .layer(axum_middleware::from_fn(middleware::cors))
        .with_state(state)
}
