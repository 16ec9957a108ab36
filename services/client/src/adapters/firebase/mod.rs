//! services/client/src/adapters/firebase/mod.rs
//!
//! Adapters for the managed Firebase platform, spoken over its public REST
//! APIs: Identity Toolkit for accounts, Firestore for documents and Firebase
//! Storage for files. The Firestore and Storage adapters borrow the signed-in
//! user's ID token from `FirebaseAuth`.

pub mod auth;
pub mod firestore;
pub mod storage;

pub use auth::FirebaseAuth;
pub use firestore::Firestore;
pub use storage::FirebaseStorage;

use crybaby_core::ports::PortError;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Base URLs of the REST APIs. Overridable so the adapters can be pointed at
/// an emulator or a test server.
#[derive(Clone, Debug)]
pub struct FirebaseEndpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
    pub firestore: String,
    pub storage: String,
}

impl Default for FirebaseEndpoints {
    fn default() -> Self {
        Self {
            identity_toolkit: "https://identitytoolkit.googleapis.com/v1".to_string(),
            secure_token: "https://securetoken.googleapis.com/v1".to_string(),
            firestore: "https://firestore.googleapis.com/v1".to_string(),
            storage: "https://firebasestorage.googleapis.com/v0".to_string(),
        }
    }
}

impl FirebaseEndpoints {
    /// Points every API at one server, as the local emulator suite and tests do.
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            identity_toolkit: format!("{}/identitytoolkit/v1", base),
            secure_token: format!("{}/securetoken/v1", base),
            firestore: format!("{}/firestore/v1", base),
            storage: format!("{}/storage/v0", base),
        }
    }
}

/// Reads a Google API response, mapping error payloads
/// (`{"error": {"message": ...}}`) onto `PortError`.
pub(crate) async fn read_json(response: Response) -> Result<Value, PortError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body).map_err(|e| PortError::Malformed(e.to_string()));
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with {}", status));

    Err(match status {
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        _ => PortError::Provider(message),
    })
}
