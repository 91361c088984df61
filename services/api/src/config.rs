//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub fortune_model: String,
    pub toss_secret_key: String,
    pub toss_api_base: String,
    /// Base URL of the public site, used to build payment redirect URLs.
    pub site_base_url: String,
    // OAuth client pairs are consumed by the external auth layer; they are
    // recognized here so one `.env` covers the whole deployment.
    pub kakao_client_id: Option<String>,
    pub kakao_client_secret: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load External Service Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let fortune_model =
            std::env::var("FORTUNE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let toss_secret_key = std::env::var("TOSS_SECRET_KEY")
            .map_err(|_| ConfigError::MissingVar("TOSS_SECRET_KEY".to_string()))?;
        let toss_api_base = std::env::var("TOSS_API_BASE")
            .unwrap_or_else(|_| "https://api.tosspayments.com".to_string());

        let site_base_url = std::env::var("SITE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            fortune_model,
            toss_secret_key,
            toss_api_base,
            site_base_url: site_base_url.trim_end_matches('/').to_string(),
            kakao_client_id: std::env::var("KAKAO_CLIENT_ID").ok(),
            kakao_client_secret: std::env::var("KAKAO_CLIENT_SECRET").ok(),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok(),
        })
    }
}
