/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration.
 *
 * # Configuration Sources
 *
 * Configuration is read from environment variables (after `.env` has been
 * loaded by the binary), with defaults suitable for local development:
 *
 * | Variable                | Default                        |
 * |-------------------------|--------------------------------|
 * | `DATABASE_URL`          | unset: in-memory store         |
 * | `FRONTEND_URL`          | `http://localhost:3000`        |
 * | `PORT`                  | `8080`                         |
 * | `MODERATION_URL`        | `https://vector.profanity.dev` |
 * | `MODERATION_TIMEOUT_MS` | `3000`                         |
 * | `EDIT_COOLDOWN_SECS`    | `10`                           |
 * | `SESSION_QUEUE_DEPTH`   | `256`                          |
 *
 * # Error Handling
 *
 * Malformed values are configuration errors. A database that cannot be
 * reached is not: the server logs it and falls back to the in-memory store.
 */

use reqwest::Url;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backend::collab::db::PostgresStore;
use crate::backend::collab::memory::MemoryStore;
use crate::backend::collab::store::SharedStore;
use crate::backend::moderation::client::{DEFAULT_MODERATION_TIMEOUT, DEFAULT_MODERATION_URL};
use crate::backend::realtime::hub::DEFAULT_QUEUE_DEPTH;
use crate::backend::realtime::session::DEFAULT_EDIT_COOLDOWN;

pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL for {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("invalid number for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("SESSION_QUEUE_DEPTH must be at least 1")]
    ZeroQueueDepth,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub port: u16,
    pub moderation_url: String,
    pub moderation_timeout: Duration,
    pub edit_cooldown: Duration,
    pub session_queue_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: DEFAULT_PORT,
            moderation_url: DEFAULT_MODERATION_URL.to_string(),
            moderation_timeout: DEFAULT_MODERATION_TIMEOUT,
            edit_cooldown: DEFAULT_EDIT_COOLDOWN,
            session_queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        let mut builder = Self::builder();

        if let Some(url) = read("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(url) = read("FRONTEND_URL") {
            builder = builder.frontend_url(url);
        }
        if let Some(port) = read("PORT") {
            builder = builder.port(parse_number("PORT", &port)?);
        }
        if let Some(url) = read("MODERATION_URL") {
            builder = builder.moderation_url(url);
        }
        if let Some(millis) = read("MODERATION_TIMEOUT_MS") {
            builder = builder.moderation_timeout(Duration::from_millis(parse_number("MODERATION_TIMEOUT_MS", &millis)?));
        }
        if let Some(secs) = read("EDIT_COOLDOWN_SECS") {
            builder = builder.edit_cooldown(Duration::from_secs(parse_number("EDIT_COOLDOWN_SECS", &secs)?));
        }
        if let Some(depth) = read("SESSION_QUEUE_DEPTH") {
            builder = builder.session_queue_depth(parse_number("SESSION_QUEUE_DEPTH", &depth)?);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("FRONTEND_URL", &self.frontend_url)?;
        validate_url("MODERATION_URL", &self.moderation_url)?;
        if self.session_queue_depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    database_url: Option<String>,
    frontend_url: Option<String>,
    port: Option<u16>,
    moderation_url: Option<String>,
    moderation_timeout: Option<Duration>,
    edit_cooldown: Option<Duration>,
    session_queue_depth: Option<usize>,
}

impl AppConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = Some(url.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn moderation_url(mut self, url: impl Into<String>) -> Self {
        self.moderation_url = Some(url.into());
        self
    }

    pub fn moderation_timeout(mut self, timeout: Duration) -> Self {
        self.moderation_timeout = Some(timeout);
        self
    }

    pub fn edit_cooldown(mut self, cooldown: Duration) -> Self {
        self.edit_cooldown = Some(cooldown);
        self
    }

    pub fn session_queue_depth(mut self, depth: usize) -> Self {
        self.session_queue_depth = Some(depth);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            database_url: self.database_url,
            frontend_url: self.frontend_url.unwrap_or(defaults.frontend_url),
            port: self.port.unwrap_or(defaults.port),
            moderation_url: self.moderation_url.unwrap_or(defaults.moderation_url),
            moderation_timeout: self.moderation_timeout.unwrap_or(defaults.moderation_timeout),
            edit_cooldown: self.edit_cooldown.unwrap_or(defaults.edit_cooldown),
            session_queue_depth: self.session_queue_depth.unwrap_or(defaults.session_queue_depth),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

fn validate_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map(|_| ()).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
    })
}

/// Connect to PostgreSQL and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if the connection fails
///
/// Migration failures are logged; the pool is still returned since the
/// schema may already be current.
pub async fn load_database(database_url: &str) -> Option<PgPool> {
    tracing::info!("[Store] Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("[Store] Failed to create database connection pool: {:?}", e);
            return None;
        }
    };

    tracing::info!("[Store] Database connection pool created successfully");

    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("[Store] Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("[Store] Failed to run database migrations: {}", e);
            tracing::warn!("[Store] Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Choose the document store for `config`
///
/// PostgreSQL when `DATABASE_URL` is set and reachable, otherwise the
/// in-memory store.
pub async fn open_store(config: &AppConfig) -> SharedStore {
    if let Some(url) = &config.database_url {
        if let Some(pool) = load_database(url).await {
            return Arc::new(PostgresStore::new(pool));
        }
        tracing::warn!("[Store] Database unavailable, documents will be kept in memory");
    } else {
        tracing::warn!("[Store] DATABASE_URL not set, documents will be kept in memory");
    }
    Arc::new(MemoryStore::new())
}
