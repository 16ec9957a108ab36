//! services/api/src/web/oauth.rs
//!
//! The browser side of the Google login used by the calendar: a redirect to
//! the consent page, and the callback that stores the resulting token.

use crate::web::protocol::{json_error, OAuthCallback};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the browser lands after a successful login. The client consumes the
/// query flag on start-up.
pub const LOGIN_SUCCESS_REDIRECT: &str = "/?google_auth_success=true";

/// Start the Google login.
#[utoipa::path(
    get,
    path = "/login/google",
    responses(
        (status = 307, description = "Redirect to the Google consent page"),
        (status = 503, description = "Calendar not configured")
    )
)]
pub async fn login_google(State(app_state): State<Arc<AppState>>) -> Response {
    let Some(access) = &app_state.calendar else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Google Calendar is not configured on this server",
        );
    };
    Redirect::temporary(&access.oauth.authorization_url(&app_state.oauth_state)).into_response()
}

/// OAuth redirect target.
///
/// Any failure sends the browser back to `/` without the success flag.
#[utoipa::path(
    get,
    path = "/oauth2callback",
    params(OAuthCallback),
    responses(
        (status = 307, description = "Redirect back to the app")
    )
)]
pub async fn oauth2callback(
    State(app_state): State<Arc<AppState>>,
    Query(callback): Query<OAuthCallback>,
) -> Redirect {
    let home = Redirect::temporary("/");
    let Some(access) = &app_state.calendar else {
        return home;
    };
    if callback.state.as_deref() != Some(app_state.oauth_state.as_str()) {
        warn!("Invalid OAuth state on callback");
        return home;
    }
    if let Some(reason) = callback.error {
        warn!("Google login was not completed: {}", reason);
        return home;
    }
    let Some(code) = callback.code.filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without a code");
        return home;
    };

    let token = match access.oauth.exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            error!("Unable to retrieve token from Google: {}", e);
            return home;
        }
    };
    if let Err(e) = access.tokens.save(&token).await {
        error!("Unable to cache OAuth token: {}", e);
        return home;
    }
    info!("Google login completed");
    Redirect::temporary(LOGIN_SUCCESS_REDIRECT)
}
