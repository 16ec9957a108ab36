//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// OAuth client registration used for the calendar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub youtube_api_key: String,
    /// `None` leaves the calendar endpoints answering 503.
    pub google_oauth: Option<GoogleOAuthSettings>,
    pub calendar_token_path: PathBuf,
    pub calendar_time_zone: String,
    pub static_dir: PathBuf,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        // --- Provider Keys ---
        let gemini_api_key = required("GEMINI_API_KEY")?;
        let gemini_model =
            lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-pro-latest".to_string());
        let youtube_api_key = required("YOUTUBE_API_KEY")?;

        // --- Calendar ---
        // All three OAuth settings or none of them.
        let oauth_keys = ["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET", "GOOGLE_REDIRECT_URL"];
        let google_oauth = if oauth_keys.iter().all(|k| lookup(k).is_none()) {
            None
        } else {
            Some(GoogleOAuthSettings {
                client_id: required("GOOGLE_CLIENT_ID")?,
                client_secret: required("GOOGLE_CLIENT_SECRET")?,
                redirect_url: required("GOOGLE_REDIRECT_URL")?,
            })
        };
        let calendar_token_path = lookup("CALENDAR_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("token.json"));
        let calendar_time_zone =
            lookup("CALENDAR_TIME_ZONE").unwrap_or_else(|| "America/Los_Angeles".to_string());

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            gemini_model,
            youtube_api_key,
            google_oauth,
            calendar_token_path,
            calendar_time_zone,
            static_dir,
        })
    }
}
