//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the JSON proxy endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    json_data, json_error, ApiResponse, CalendarEventRequest, TutorRequest, YoutubeQuery,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Json, Response},
};
use crybaby_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

/// Number of hits asked of the search provider.
pub const MAX_VIDEO_RESULTS: u32 = 10;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        tutor_handler,
        youtube_handler,
        calendar_event_handler,
        crate::web::oauth::login_google,
        crate::web::oauth::oauth2callback,
    ),
    components(
        schemas(ApiResponse, TutorRequest, CalendarEventRequest)
    ),
    tags(
        (name = "CRYBABY API", description = "Backend proxy for the tutor, video search and calendar.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Ask the tutor model.
///
/// Forwards the prompt to the generative model and returns its raw response
/// under `data`.
#[utoipa::path(
    post,
    path = "/api/tutor",
    request_body = TutorRequest,
    responses(
        (status = 200, description = "The model's response", body = ApiResponse),
        (status = 400, description = "Invalid request body", body = ApiResponse),
        (status = 405, description = "Invalid request method", body = ApiResponse),
        (status = 500, description = "The model call failed", body = ApiResponse)
    )
)]
pub async fn tutor_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<TutorRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid request body");
    };

    match app_state.model.generate_content(&request.prompt).await {
        Ok(response) => json_data(response),
        Err(e) => {
            error!("Failed to generate content: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate content")
        }
    }
}

/// Answers any method other than the route's own.
pub async fn invalid_method() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
}

/// Search for videos.
#[utoipa::path(
    get,
    path = "/api/youtube",
    params(YoutubeQuery),
    responses(
        (status = 200, description = "The raw search response", body = ApiResponse),
        (status = 400, description = "Missing search query", body = ApiResponse),
        (status = 500, description = "The search call failed", body = ApiResponse)
    )
)]
pub async fn youtube_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<YoutubeQuery>,
) -> Response {
    let Some(q) = query.q.filter(|q| !q.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing search query");
    };

    match app_state.videos.search(&q, MAX_VIDEO_RESULTS).await {
        Ok(response) => json_data(response),
        Err(e) => {
            error!("Error calling YouTube API: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error calling YouTube API")
        }
    }
}

/// Add an event to the primary calendar.
///
/// Needs a completed Google login; without one the response is 401 and the
/// client is expected to send the user to `/login/google`.
#[utoipa::path(
    post,
    path = "/api/calendar/event",
    request_body = CalendarEventRequest,
    responses(
        (status = 200, description = "The created event", body = ApiResponse),
        (status = 400, description = "Invalid request body", body = ApiResponse),
        (status = 401, description = "Google login required", body = ApiResponse),
        (status = 500, description = "The calendar call failed", body = ApiResponse),
        (status = 503, description = "Calendar not configured", body = ApiResponse)
    )
)]
pub async fn calendar_event_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<CalendarEventRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid request body");
    };
    let Some(access) = &app_state.calendar else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Google Calendar is not configured on this server",
        );
    };
    if request.summary.trim().is_empty() || request.end < request.start {
        return json_error(StatusCode::BAD_REQUEST, "Invalid request body");
    }

    match access.calendar.insert_event(&request.into()).await {
        Ok(created) => {
            info!("Calendar event created");
            json_data(created)
        }
        Err(PortError::Unauthorized(message)) => {
            warn!("Calendar login required: {}", message);
            json_error(StatusCode::UNAUTHORIZED, message)
        }
        Err(e) => {
            error!("Failed to create calendar event: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create calendar event")
        }
    }
}
