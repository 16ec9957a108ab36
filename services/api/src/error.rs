//! services/api/src/error.rs
//!
//! Start-up errors of the proxy. Request-time failures never reach this type;
//! handlers turn them into JSON error envelopes.

use crate::config::ConfigError;
use crybaby_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Binding the listener or serving connections.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The shared outbound HTTP client could not be built (TLS backend, proxy settings).
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
