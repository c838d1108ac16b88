use std::env;

use serde::Deserialize;
use thiserror::Error;

use crate::services::status::TransitionPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// When unset the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: String,
    pub frontend_urls: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid engine settings: {0}")]
    Settings(#[from] config::ConfigError),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVariable("JWT_SECRET".to_string()))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidFormat("SERVER_PORT must be a valid port number".to_string()))?;

        // Parse allowed origins
        let frontend_urls = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(AppConfig {
            database_url,
            jwt_secret,
            environment,
            port,
            frontend_urls,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Business-rule switches and retention windows, read from `TASKBOARD_*`
/// environment variables (e.g. `TASKBOARD_STRICT_TRANSITIONS=true`).
#[derive(Debug, Clone, Deserialize)]
pub struct EnginePolicy {
    /// Enforce the status workflow graph instead of accepting any target status.
    #[serde(default)]
    pub strict_transitions: bool,
    /// Newest comments kept per task by retention maintenance.
    #[serde(default = "default_comment_retention")]
    pub comment_retention: usize,
    #[serde(default = "default_read_mark_retention_days")]
    pub read_mark_retention_days: i64,
    #[serde(default = "default_completed_retention_days")]
    pub completed_retention_days: i64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_comment_retention() -> usize {
    200
}

fn default_read_mark_retention_days() -> i64 {
    180
}

fn default_completed_retention_days() -> i64 {
    365
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for EnginePolicy {
    fn default() -> Self {
        EnginePolicy {
            strict_transitions: false,
            comment_retention: default_comment_retention(),
            read_mark_retention_days: default_read_mark_retention_days(),
            completed_retention_days: default_completed_retention_days(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl EnginePolicy {
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TASKBOARD").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.strict_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn strict() -> Self {
        EnginePolicy {
            strict_transitions: true,
            ..EnginePolicy::default()
        }
    }
}
