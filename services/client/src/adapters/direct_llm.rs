//! services/client/src/adapters/direct_llm.rs
//!
//! This module contains the tutor strategy that talks to an OpenAI-compatible
//! chat-completions endpoint directly, using a key supplied by the user.

use async_trait::async_trait;
use crybaby_core::ports::{PortError, PortResult, TutorStrategy};
use reqwest::Client;
use serde_json::{json, Value};

const SYSTEM_INSTRUCTIONS: &str = "You are a friendly tutor for children. Explain in simple \
child-friendly language. Use emojis and an encouraging tone.";

/// Returned when the direct tier is the last one to fail.
pub const DIRECT_APOLOGY: &str =
    "I couldn't reach the real API. I'll help with my built-in tutor instead 😊";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A tutor strategy backed by a chat-completions API.
#[derive(Clone)]
pub struct DirectChatTutor {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DirectChatTutor {
    /// Creates a new `DirectChatTutor`. `base_url` is the API root, e.g.
    /// `https://api.openai.com/v1`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTIONS },
                { "role": "user", "content": prompt }
            ],
            "max_tokens": 400
        })
    }
}

/// Reads the first choice's text: `message.content` for chat responses, or the
/// legacy completion `text` field.
pub fn extract_choice_text(value: &Value) -> Option<String> {
    let choice = value.pointer("/choices/0")?;
    choice
        .pointer("/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| choice.get("text").and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

//=========================================================================================
// `TutorStrategy` Trait Implementation
//=========================================================================================

#[async_trait]
impl TutorStrategy for DirectChatTutor {
    fn name(&self) -> &str {
        "direct"
    }

    fn apology(&self) -> &str {
        DIRECT_APOLOGY
    }

    async fn ask(&self, prompt: &str) -> PortResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        let value: Value = response
            .json()
            .await
            .map_err(|e| PortError::Malformed(e.to_string()))?;

        if !status.is_success() {
            let message = value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Err(PortError::Remote(format!("{}: {}", status, message)));
        }

        extract_choice_text(&value).ok_or_else(|| {
            PortError::Malformed("chat completion returned no choices".to_string())
        })
    }
}
