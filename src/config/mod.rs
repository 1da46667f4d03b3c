//! Configuration management
//!
//! Configuration is loaded from `config.yml` and then overridden by
//! `USERBASE_*` environment variables. Missing optional values are filled
//! with defaults; the signing secret has no default and must be provided.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session token configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Log sink configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served as static files ahead of the API routes
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            body_limit: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1MB
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, `sqlite:` URL, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "database/data.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    #[serde(default)]
    pub secret: Option<String>,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// Name of the cookie carrying the token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Check login credentials against stored users.
    ///
    /// Off by default: login then issues a token for any name/password pair.
    #[serde(default)]
    pub verify_credentials: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_seconds: default_token_ttl(),
            cookie_name: default_cookie_name(),
            verify_credentials: false,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("cookie_name", &self.cookie_name)
            .field("verify_credentials", &self.verify_credentials)
            .finish()
    }
}

fn default_token_ttl() -> u64 {
    3600
}

fn default_cookie_name() -> String {
    "token".to_string()
}

/// Log sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory holding the info and error log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Error responses carry diagnostic detail (default)
    #[default]
    Development,
    /// Error responses omit diagnostic detail
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `USERBASE_<SECTION>_<KEY>`,
    /// e.g. `USERBASE_SERVER_PORT` or `USERBASE_AUTH_SECRET`. The environment
    /// itself is selected with `USERBASE_ENVIRONMENT`.
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the values that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.auth.secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "auth.secret must be set (or USERBASE_AUTH_SECRET)".to_string(),
                ))
            }
        }
        if self.auth.token_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_seconds must be greater than zero".to_string(),
            ));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.cookie_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("USERBASE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("USERBASE_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(dir) = std::env::var("USERBASE_SERVER_PUBLIC_DIR") {
            self.server.public_dir = PathBuf::from(dir);
        }
        if let Some(limit) = env_parse::<usize>("USERBASE_SERVER_BODY_LIMIT") {
            self.server.body_limit = limit;
        }

        // Database configuration
        if let Ok(url) = std::env::var("USERBASE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = env_parse::<u32>("USERBASE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }

        // Auth configuration
        if let Ok(secret) = std::env::var("USERBASE_AUTH_SECRET") {
            self.auth.secret = Some(secret);
        }
        if let Some(ttl) = env_parse::<u64>("USERBASE_AUTH_TOKEN_TTL_SECONDS") {
            self.auth.token_ttl_seconds = ttl;
        }
        if let Ok(name) = std::env::var("USERBASE_AUTH_COOKIE_NAME") {
            self.auth.cookie_name = name;
        }
        if let Some(verify) = env_parse::<bool>("USERBASE_AUTH_VERIFY_CREDENTIALS") {
            self.auth.verify_credentials = verify;
        }

        // Log configuration
        if let Ok(dir) = std::env::var("USERBASE_LOG_DIR") {
            self.log.dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("USERBASE_LOG_LEVEL") {
            self.log.level = level;
        }

        if let Ok(env) = std::env::var("USERBASE_ENVIRONMENT") {
            match env.to_lowercase().as_str() {
                "production" => self.environment = Environment::Production,
                "development" => self.environment = Environment::Development,
                _ => {} // Ignore invalid values
            }
        }
    }
}

/// Read and parse an environment variable, ignoring unparseable values
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
