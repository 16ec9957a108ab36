pub mod oauth;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use oauth::{login_google, oauth2callback};
use rest::{calendar_event_handler, invalid_method, tutor_handler, youtube_handler, ApiDoc};
use state::AppState;

/// Builds the full application: the JSON endpoints, the OAuth routes, Swagger
/// UI, and the static front end as the fallback for every other path.
pub fn router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();

    let api_router = Router::new()
        .route("/api/tutor", post(tutor_handler).fallback(invalid_method))
        .route("/api/youtube", get(youtube_handler))
        .route(
            "/api/calendar/event",
            post(calendar_event_handler).fallback(invalid_method),
        )
        .route("/login/google", get(login_google))
        .route("/oauth2callback", get(oauth2callback))
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(ServeDir::new(static_dir))
        // Local development serves the front end from another port.
        .layer(CorsLayer::permissive())
}
