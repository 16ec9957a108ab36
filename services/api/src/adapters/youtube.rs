//! services/api/src/adapters/youtube.rs
//!
//! YouTube Data API search, implementing the `VideoSearchProvider` port.

use super::read_google_json;
use async_trait::async_trait;
use crybaby_core::ports::{PortError, PortResult, VideoSearchProvider};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Clone)]
pub struct YouTubeSearch {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeSearch {
    pub fn new(http: Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(http, DEFAULT_YOUTUBE_BASE_URL, api_key)
    }

    pub fn with_base_url(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl VideoSearchProvider for YouTubeSearch {
    async fn search(&self, query: &str, max_results: u32) -> PortResult<Value> {
        let url = format!(
            "{}/search?part=snippet&q={}&maxResults={}&key={}",
            self.base_url,
            urlencoding::encode(query),
            max_results,
            urlencoding::encode(&self.api_key)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let value = read_google_json(response).await?;
        info!(
            "YouTube search for '{}' returned {} items",
            query,
            value
                .get("items")
                .and_then(serde_json::Value::as_array)
                .map_or(0, Vec::len)
        );
        Ok(value)
    }
}
