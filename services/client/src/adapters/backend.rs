//! services/client/src/adapters/backend.rs
//!
//! HTTP client for the first-party backend proxy. It implements the tutor,
//! video search and calendar ports on top of the `/api/*` endpoints.
//!
//! Every endpoint answers with a JSON envelope: either `{"data": ...}` or
//! `{"error": "..."}`.

use async_trait::async_trait;
use crybaby_core::domain::{CalendarEvent, VideoResult};
use crybaby_core::ports::{
    CalendarService, PortError, PortResult, TutorStrategy, VideoSearchService,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Where the external-login flow starts on the backend.
pub const EXTERNAL_LOGIN_PATH: &str = "/login/google";

/// Returned when the backend tier is the last one to fail.
pub const BACKEND_APOLOGY: &str =
    "I'm having a little trouble connecting to my brain right now. Please try again in a moment! 🧸";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    /// Creates a new `BackendClient` for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the tutor endpoint and extracts the answer text.
    pub async fn tutor_answer(&self, prompt: &str) -> PortResult<String> {
        let url = format!("{}/api/tutor", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let (status, body) = read_body(response).await?;
        let envelope = parse_envelope(status, &body)?;
        if !status.is_success() {
            return Err(PortError::Remote(format!("tutor endpoint returned {}", status)));
        }
        extract_candidate_text(&envelope)
            .ok_or_else(|| PortError::Malformed("no candidate text in tutor response".to_string()))
    }
}

async fn read_body(response: reqwest::Response) -> PortResult<(StatusCode, String)> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok((status, body))
}

/// Parses an envelope, turning `{"error": ...}` into `PortError::Remote`
/// (or `Unauthorized` for 401).
fn parse_envelope(status: StatusCode, body: &str) -> PortResult<Value> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            PortError::Malformed(e.to_string())
        } else {
            PortError::Remote(format!("backend returned {}", status))
        }
    })?;

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        if !message.is_empty() {
            return Err(if status == StatusCode::UNAUTHORIZED {
                PortError::Unauthorized(message.to_string())
            } else {
                PortError::Remote(message.to_string())
            });
        }
    }
    Ok(value)
}

/// Extracts the answer from a tutor response. Two shapes are in circulation:
/// the enveloped `data.candidates[0]...` and the bare `candidates[0]...`.
pub fn extract_candidate_text(value: &Value) -> Option<String> {
    const PATHS: [&str; 2] = [
        "/data/candidates/0/content/parts/0/text",
        "/candidates/0/content/parts/0/text",
    ];
    PATHS
        .iter()
        .find_map(|path| value.pointer(path).and_then(Value::as_str))
        .map(str::to_string)
}

/// Reads `data.items` from a search response. Hits without a video id
/// (channels, playlists) are skipped.
pub fn parse_video_results(value: &Value) -> PortResult<Vec<VideoResult>> {
    let items = value
        .pointer("/data/items")
        .and_then(Value::as_array)
        .ok_or_else(|| PortError::Malformed("search response has no data.items".to_string()))?;

    let mut videos = Vec::with_capacity(items.len());
    for item in items {
        let Some(video_id) = item.pointer("/id/videoId").and_then(Value::as_str) else {
            debug!("Skipping search hit without a video id");
            continue;
        };
        let title = item
            .pointer("/snippet/title")
            .and_then(Value::as_str)
            .ok_or_else(|| PortError::Malformed(format!("video {} has no title", video_id)))?;
        let thumbnail_url = item
            .pointer("/snippet/thumbnails/default/url")
            .and_then(Value::as_str)
            .ok_or_else(|| PortError::Malformed(format!("video {} has no thumbnail", video_id)))?;
        videos.push(VideoResult {
            video_id: video_id.to_string(),
            title: title.to_string(),
            thumbnail_url: thumbnail_url.to_string(),
        });
    }
    Ok(videos)
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl VideoSearchService for BackendClient {
    async fn search_videos(&self, query: &str) -> PortResult<Vec<VideoResult>> {
        let url = format!(
            "{}/api/youtube?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let (status, body) = read_body(response).await?;
        let envelope = parse_envelope(status, &body)?;
        let videos = parse_video_results(&envelope)?;
        info!("Video search for '{}' returned {} results", query, videos.len());
        Ok(videos)
    }
}

#[async_trait]
impl CalendarService for BackendClient {
    async fn create_event(&self, event: &CalendarEvent) -> PortResult<()> {
        let url = format!("{}/api/calendar/event", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(event)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let (status, body) = read_body(response).await?;
        parse_envelope(status, &body)?;
        Ok(())
    }
}

/// The backend tutor endpoint as a tutor strategy.
pub struct BackendTutor {
    client: Arc<BackendClient>,
}

impl BackendTutor {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TutorStrategy for BackendTutor {
    fn name(&self) -> &str {
        "backend"
    }

    fn apology(&self) -> &str {
        BACKEND_APOLOGY
    }

    async fn ask(&self, prompt: &str) -> PortResult<String> {
        self.client.tutor_answer(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_tutor_shapes_are_accepted() {
        let wrapped = json!({"data": {"candidates": [{"content": {"parts": [{"text": "wrapped"}]}}]}});
        let bare = json!({"candidates": [{"content": {"parts": [{"text": "bare"}]}}]});
        assert_eq!(extract_candidate_text(&wrapped).as_deref(), Some("wrapped"));
        assert_eq!(extract_candidate_text(&bare).as_deref(), Some("bare"));
        assert_eq!(extract_candidate_text(&json!({"data": {}})), None);
    }

    #[test]
    fn error_payload_maps_by_status() {
        let body = r#"{"error":"Please log in again"}"#;
        assert_eq!(
            parse_envelope(StatusCode::UNAUTHORIZED, body),
            Err(PortError::Unauthorized("Please log in again".into()))
        );
        assert_eq!(
            parse_envelope(StatusCode::INTERNAL_SERVER_ERROR, body),
            Err(PortError::Remote("Please log in again".into()))
        );
    }

    #[test]
    fn non_json_bodies() {
        assert!(matches!(
            parse_envelope(StatusCode::OK, "<html>"),
            Err(PortError::Malformed(_))
        ));
        assert!(matches!(
            parse_envelope(StatusCode::BAD_GATEWAY, "<html>"),
            Err(PortError::Remote(_))
        ));
    }

    #[test]
    fn video_hits_without_ids_are_skipped() {
        let body = json!({"data": {"items": [
            {"id": {"kind": "youtube#channel", "channelId": "c1"}, "snippet": {"title": "A channel"}},
            {"id": {"videoId": "v1"}, "snippet": {"title": "Fractions!", "thumbnails": {"default": {"url": "https://i/1.jpg"}}}}
        ]}});
        let videos = parse_video_results(&body).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].watch_url(), "https://www.youtube.com/watch?v=v1");
    }

    #[test]
    fn missing_items_is_malformed() {
        assert!(matches!(
            parse_video_results(&json!({"data": {}})),
            Err(PortError::Malformed(_))
        ));
    }
}
