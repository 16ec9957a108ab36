//! services/api/src/adapters/calendar.rs
//!
//! Inserts events into the logged-in user's primary Google Calendar,
//! implementing the `CalendarProvider` port. The OAuth token is read from the
//! token file and refreshed (and re-saved) when it has expired.

use super::google_oauth::{OAuthClient, StoredToken, TokenFile};
use super::read_google_json;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use crybaby_core::domain::CalendarEvent;
use crybaby_core::ports::{CalendarProvider, PortError, PortResult};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Sent back when the calendar cannot be used until the user logs in again.
pub const LOGIN_REQUIRED: &str = "Please log in with Google to use the calendar.";

pub struct GoogleCalendar {
    http: Client,
    base_url: String,
    oauth: Arc<OAuthClient>,
    tokens: Arc<TokenFile>,
    time_zone: String,
}

impl GoogleCalendar {
    pub fn new(
        http: Client,
        oauth: Arc<OAuthClient>,
        tokens: Arc<TokenFile>,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: DEFAULT_CALENDAR_BASE_URL.to_string(),
            oauth,
            tokens,
            time_zone: time_zone.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The stored token, refreshed first if needed.
    async fn valid_token(&self) -> PortResult<StoredToken> {
        let token = self
            .tokens
            .load()
            .await?
            .ok_or_else(|| PortError::Unauthorized(LOGIN_REQUIRED.to_string()))?;
        if !token.is_expired(Utc::now()) {
            return Ok(token);
        }

        info!("Calendar token expired, refreshing");
        let refreshed = self.oauth.refresh(&token).await.map_err(|e| {
            warn!("Calendar token refresh failed: {}", e);
            PortError::Unauthorized(LOGIN_REQUIRED.to_string())
        })?;
        self.tokens.save(&refreshed).await?;
        Ok(refreshed)
    }
}

/// The Calendar API event resource for `event`.
pub fn event_resource(event: &CalendarEvent, time_zone: &str) -> Value {
    json!({
        "summary": event.summary,
        "description": event.description,
        "start": {
            "dateTime": event.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "timeZone": time_zone
        },
        "end": {
            "dateTime": event.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            "timeZone": time_zone
        }
    })
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn insert_event(&self, event: &CalendarEvent) -> PortResult<Value> {
        let token = self.valid_token().await?;
        let url = format!("{}/calendars/primary/events", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&event_resource(event, &self.time_zone))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let created = read_google_json(response).await.map_err(|e| match e {
            PortError::Unauthorized(m) => {
                warn!("Calendar rejected the token: {}", m);
                PortError::Unauthorized(LOGIN_REQUIRED.to_string())
            }
            other => other,
        })?;
        info!(
            "Created calendar event {}",
            created.get("id").and_then(serde_json::Value::as_str).unwrap_or("?")
        );
        Ok(created)
    }
}
