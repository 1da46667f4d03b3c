//! Userbase - user registration and login over HTTP

use anyhow::Result;
use std::path::PathBuf;

use userbase::{
    api::{self, AppState},
    config::Config,
    db::{self, repositories::SqlxUserRepository},
    logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::var("USERBASE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    config.validate()?;

    // Initialize tracing
    logging::init(&config.log)?;
    tracing::info!("Starting userbase...");
    tracing::info!(environment = ?config.environment, "Configuration loaded");

    // Initialize database
    let db = db::create_pool(&config.database).await?;
    db.ping().await?;
    db::schema::ensure_schema(&db).await?;
    tracing::info!("Database ready: {}", config.database.url);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Build application state
    let state = AppState::new(config, SqlxUserRepository::boxed(db.clone()))?;

    // Build router
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
