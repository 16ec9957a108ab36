//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use crybaby_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Input rejected locally, before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The first half of a two-step remote write succeeded and the second did not.
    /// `dangling` names what was left behind.
    #[error("{step} failed after an earlier step succeeded; left behind {dangling}: {source}")]
    Incomplete {
        step: &'static str,
        dangling: String,
        source: PortError,
    },

    /// Represents a standard Input/Output error (e.g., reading a file to upload).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
