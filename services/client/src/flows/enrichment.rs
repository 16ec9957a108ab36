//! services/client/src/flows/enrichment.rs
//!
//! Video search and calendar events through the backend proxy. Calendar
//! creation is the one flow with a "log in to the external account again"
//! branch.

use crate::adapters::backend::EXTERNAL_LOGIN_PATH;
use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use crybaby_core::domain::{CalendarEvent, VideoResult};
use crybaby_core::ports::{CalendarService, PortError, VideoSearchService, View};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EVENT_MISSING_FIELDS: &str = "Please fill out all fields to create an event.";
pub const EVENT_OK: &str = "Event created successfully!";
pub const EVENT_FAILED: &str = "Failed to create event. See console for details.";

/// Normalises a user-entered time to UTC. Accepts RFC 3339, or a local
/// `YYYY-MM-DDTHH:MM[:SS]` as produced by date-time pickers.
pub fn normalize_event_time(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

pub struct EnrichmentProxies {
    videos: Arc<dyn VideoSearchService>,
    calendar: Arc<dyn CalendarService>,
    view: Arc<dyn View>,
}

impl EnrichmentProxies {
    pub fn new(
        videos: Arc<dyn VideoSearchService>,
        calendar: Arc<dyn CalendarService>,
        view: Arc<dyn View>,
    ) -> Self {
        Self {
            videos,
            calendar,
            view,
        }
    }

    /// Renders the results, replacing anything shown before. Failures are
    /// logged and leave the previous results on screen.
    pub async fn search_videos(&self, query: &str) -> ClientResult<Vec<VideoResult>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        match self.videos.search_videos(query).await {
            Ok(videos) => {
                self.view.render_videos(&videos);
                Ok(videos)
            }
            Err(e) => {
                error!("Error searching videos for '{}': {}", query, e);
                Err(e.into())
            }
        }
    }

    pub async fn create_calendar_event(
        &self,
        summary: &str,
        description: &str,
        start: &str,
        end: &str,
    ) -> ClientResult<()> {
        if summary.is_empty() || start.is_empty() || end.is_empty() {
            self.view.alert(EVENT_MISSING_FIELDS);
            return Err(ClientError::Validation(EVENT_MISSING_FIELDS.to_string()));
        }

        let (Some(start_at), Some(end_at)) =
            (normalize_event_time(start), normalize_event_time(end))
        else {
            error!("Unreadable event times: start={:?} end={:?}", start, end);
            self.view.alert(EVENT_FAILED);
            return Err(ClientError::Validation(format!(
                "could not read event times '{}' and '{}'",
                start, end
            )));
        };

        let event = CalendarEvent {
            summary: summary.to_string(),
            description: description.to_string(),
            start: start_at,
            end: end_at,
        };

        match self.calendar.create_event(&event).await {
            Ok(()) => {
                info!("Created calendar event '{}'", event.summary);
                self.view.alert(EVENT_OK);
                Ok(())
            }
            Err(PortError::Unauthorized(message)) => {
                warn!("Calendar needs external login: {}", message);
                self.view.alert(&message);
                self.view.redirect(EXTERNAL_LOGIN_PATH);
                Err(PortError::Unauthorized(message).into())
            }
            Err(e) => {
                error!("Error creating calendar event: {}", e);
                self.view.alert(EVENT_FAILED);
                Err(e.into())
            }
        }
    }

    /// Sends the user to the external-login entry point.
    pub fn begin_external_login(&self) {
        self.view.redirect(EXTERNAL_LOGIN_PATH);
    }
}
