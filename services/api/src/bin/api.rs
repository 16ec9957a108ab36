//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiModel, GoogleCalendar, OAuthClient, TokenFile, YouTubeSearch},
    config::Config,
    error::ApiError,
    web::{
        router,
        state::{AppState, CalendarAccess},
    },
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .user_agent(concat!("crybaby-api/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let model = Arc::new(GeminiModel::new(
        http.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let videos = Arc::new(YouTubeSearch::new(http.clone(), config.youtube_api_key.clone()));

    let calendar = match &config.google_oauth {
        Some(settings) => {
            let oauth = Arc::new(OAuthClient::new(http.clone(), settings.clone()));
            let tokens = Arc::new(TokenFile::new(config.calendar_token_path.clone()));
            let calendar = Arc::new(GoogleCalendar::new(
                http.clone(),
                oauth.clone(),
                tokens.clone(),
                config.calendar_time_zone.clone(),
            ));
            info!(
                "Calendar enabled; token file at {}",
                config.calendar_token_path.display()
            );
            Some(CalendarAccess {
                oauth,
                tokens,
                calendar,
            })
        }
        None => {
            warn!("GOOGLE_CLIENT_ID not set; calendar endpoints are disabled");
            None
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        model,
        videos,
        calendar,
        oauth_state: Uuid::new_v4().simple().to_string(),
    });

    // --- 4. Create the Web Router ---
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
