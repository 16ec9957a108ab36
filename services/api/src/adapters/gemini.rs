//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for the Gemini text model.
//! It implements the `GenerativeModel` port from the `core` crate.

use super::read_google_json;
use async_trait::async_trait;
use crybaby_core::ports::{GenerativeModel, PortError, PortResult};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct GeminiModel {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(http: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(http, DEFAULT_GEMINI_BASE_URL, api_key, model)
    }

    pub fn with_base_url(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

//=========================================================================================
// `GenerativeModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeModel for GeminiModel {
    /// Sends the prompt as a single user turn and returns the raw
    /// `GenerateContentResponse` (candidates, usage metadata, ...).
    async fn generate_content(&self, prompt: &str) -> PortResult<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        debug!("Calling Gemini model {}", self.model);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        read_google_json(response).await
    }
}
