//! Application configuration loaded from environment variables.
//!
//! Upstream account secrets are read once at startup and only ever used to
//! derive a session cookie; they are redacted from `Debug` output.

use std::env;
use std::fmt;
use std::time::Duration;

/// Default upstream API origin.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://members-ng.iracing.com";

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Upstream API origin (no trailing slash)
    pub upstream_base_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Minimum spacing between upstream login attempts
    pub login_cooldown: Duration,
    /// Maximum age of a servable race page
    pub cache_ttl: Duration,
    /// How often expired race pages are swept
    pub cache_purge_interval: Duration,
    /// Timeout applied to every upstream HTTP call
    pub upstream_timeout: Duration,
    /// GCP project for the race archive; persistence is off when unset
    pub gcp_project_id: Option<String>,

    // --- Secrets ---
    /// Upstream account email
    pub upstream_username: String,
    /// Upstream account password
    pub upstream_password: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("upstream_base_url", &self.upstream_base_url)
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("login_cooldown", &self.login_cooldown)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_purge_interval", &self.cache_purge_interval)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("gcp_project_id", &self.gcp_project_id)
            .field("upstream_username", &"<redacted>")
            .field("upstream_password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            upstream_base_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 3001,
            login_cooldown: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(5 * 60),
            cache_purge_interval: Duration::from_secs(10 * 60),
            upstream_timeout: Duration::from_secs(30),
            gcp_project_id: None,
            upstream_username: "racer@example.com".to_string(),
            upstream_password: "test_password".to_string(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            upstream_base_url: env::var("IRACING_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_BASE_URL.to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 3001)?,
            login_cooldown: Duration::from_secs(parse_var("LOGIN_COOLDOWN_SECS", 60)?),
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", 5 * 60)?),
            cache_purge_interval: Duration::from_secs(parse_var(
                "CACHE_PURGE_INTERVAL_SECS",
                10 * 60,
            )?),
            upstream_timeout: Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", 30)?),
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            upstream_username: env::var("IRACING_USERNAME")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("IRACING_USERNAME"))?,
            upstream_password: env::var("IRACING_PASSWORD")
                .map_err(|_| ConfigError::Missing("IRACING_PASSWORD"))?,
        })
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
