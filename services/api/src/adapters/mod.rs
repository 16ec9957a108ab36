//! services/api/src/adapters/mod.rs
//!
//! Clients for the Google APIs the proxy fronts. All of them speak plain REST
//! through `reqwest`.

pub mod calendar;
pub mod gemini;
pub mod google_oauth;
pub mod youtube;

pub use calendar::GoogleCalendar;
pub use gemini::GeminiModel;
pub use google_oauth::{OAuthClient, StoredToken, TokenFile};
pub use youtube::YouTubeSearch;

use crybaby_core::ports::PortError;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Reads a Google API response. Error payloads look like
/// `{"error": {"code": 400, "message": "..."}}`, or for the OAuth token
/// endpoint `{"error": "invalid_grant", "error_description": "..."}`.
pub(crate) async fn read_google_json(response: Response) -> Result<Value, PortError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| PortError::Malformed(e.to_string()));
    }

    let parsed = serde_json::from_str::<Value>(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error_description"))
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with {}", status));

    Err(match status {
        StatusCode::UNAUTHORIZED => PortError::Unauthorized(message),
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        _ => PortError::Provider(message),
    })
}
