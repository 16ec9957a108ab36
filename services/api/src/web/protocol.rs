//! services/api/src/web/protocol.rs
//!
//! Request and response bodies of the JSON endpoints. Every JSON response is
//! an envelope carrying either `data` or `error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use crybaby_core::domain::CalendarEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// The response envelope.
#[derive(Serialize, Deserialize, Debug, Default, ToSchema)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

/// An error envelope with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

/// A `200 OK` data envelope.
pub fn json_data(data: Value) -> Response {
    (StatusCode::OK, Json(ApiResponse::data(data))).into_response()
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct TutorRequest {
    pub prompt: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YoutubeQuery {
    /// Free-text search query.
    pub q: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CalendarEventRequest {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<CalendarEventRequest> for CalendarEvent {
    fn from(req: CalendarEventRequest) -> Self {
        Self {
            summary: req.summary,
            description: req.description,
            start: req.start,
            end: req.end,
        }
    }
}

/// Query parameters Google appends to the OAuth redirect.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallback {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_omits_the_empty_half() {
        assert_eq!(
            serde_json::to_value(ApiResponse::data(json!({"id": 1}))).unwrap(),
            json!({"data": {"id": 1}})
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::error("Missing search query")).unwrap(),
            json!({"error": "Missing search query"})
        );
    }

    #[test]
    fn calendar_request_accepts_offsets() {
        let req: CalendarEventRequest = serde_json::from_value(json!({
            "summary": "Math",
            "start": "2024-05-01T10:00:00.000Z",
            "end": "2024-05-01T12:00:00+01:00"
        }))
        .unwrap();
        let event = CalendarEvent::from(req);
        assert_eq!(event.description, "");
        assert_eq!(event.end - event.start, chrono::Duration::hours(1));
    }
}
