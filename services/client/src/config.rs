//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

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

/// Which managed platform backs auth, documents and files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformKind {
    /// Everything kept in process memory. Nothing survives a restart.
    Memory,
    Firebase(FirebaseSettings),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
}

/// Settings for calling a chat-completions provider directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectProviderSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl DirectProviderSettings {
    /// The direct tier is only used when switched on and a key is present.
    pub fn usable_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub platform: PlatformKind,
    pub backend_url: String,
    pub session_path: PathBuf,
    pub direct_provider: DirectProviderSettings,
    pub tutor_fallback: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Platform ---
        let platform_str = lookup("CRYBABY_PLATFORM").unwrap_or_else(|| "memory".to_string());
        let platform = match platform_str.to_lowercase().as_str() {
            "memory" => PlatformKind::Memory,
            "firebase" => {
                let required = |key: &str| {
                    lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
                };
                PlatformKind::Firebase(FirebaseSettings {
                    api_key: required("FIREBASE_API_KEY")?,
                    project_id: required("FIREBASE_PROJECT_ID")?,
                    storage_bucket: required("FIREBASE_STORAGE_BUCKET")?,
                })
            }
            other => {
                return Err(ConfigError::InvalidValue(
                    "CRYBABY_PLATFORM".to_string(),
                    format!("'{}' is not one of memory, firebase", other),
                ))
            }
        };

        let backend_url = lookup("CRYBABY_BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let session_path = lookup("CRYBABY_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.crybaby/session.json"));

        // --- Tutor ---
        let direct_provider = DirectProviderSettings {
            enabled: parse_bool(&lookup, "CRYBABY_USE_DIRECT_PROVIDER", false)?,
            api_key: lookup("OPENAI_API_KEY"),
            base_url: lookup("DIRECT_PROVIDER_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: lookup("DIRECT_PROVIDER_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        };
        let tutor_fallback = parse_bool(&lookup, "CRYBABY_TUTOR_FALLBACK", true)?;

        Ok(Self {
            log_level,
            platform,
            backend_url,
            session_path,
            direct_provider,
            tutor_fallback,
        })
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("'{}' is not a boolean", raw),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_memory_platform_and_local_backend() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.platform, PlatformKind::Memory);
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert!(config.tutor_fallback);
        assert!(config.direct_provider.usable_key().is_none());
    }

    #[test]
    fn firebase_requires_project_settings() {
        let err = config_from(&[("CRYBABY_PLATFORM", "firebase"), ("FIREBASE_API_KEY", "k")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "FIREBASE_PROJECT_ID"));
    }

    #[test]
    fn direct_key_needs_the_switch() {
        let off = config_from(&[("OPENAI_API_KEY", "sk-1")]).unwrap();
        assert!(off.direct_provider.usable_key().is_none());

        let on = config_from(&[
            ("OPENAI_API_KEY", " sk-1 "),
            ("CRYBABY_USE_DIRECT_PROVIDER", "true"),
        ])
        .unwrap();
        assert_eq!(on.direct_provider.usable_key(), Some("sk-1"));

        let blank = config_from(&[
            ("OPENAI_API_KEY", "   "),
            ("CRYBABY_USE_DIRECT_PROVIDER", "1"),
        ])
        .unwrap();
        assert!(blank.direct_provider.usable_key().is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("RUST_LOG", "loud")]).is_err());
        assert!(config_from(&[("CRYBABY_TUTOR_FALLBACK", "maybe")]).is_err());
        assert!(config_from(&[("CRYBABY_PLATFORM", "sqlite")]).is_err());
    }
}
