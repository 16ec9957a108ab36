//! services/client/src/flows/launch.rs
//!
//! Start-up handling of the launch URL. The backend's OAuth callback sends the
//! user back with `?google_auth_success=true`; that marker is remembered in the
//! session store and stripped from the URL.

use crate::error::ClientResult;
use crybaby_core::ports::{SessionStore, View};
use serde_json::Value;
use tracing::info;

/// Session key remembering that the external (calendar) login completed.
pub const EXTERNAL_LOGIN_COMPLETED: &str = "google_auth_success";

/// The value of `name` in the query part of `url`, percent-decoded.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != name {
            return None;
        }
        let value = value.replace('+', " ");
        Some(
            urlencoding::decode(&value)
                .map(|v| v.into_owned())
                .unwrap_or(value),
        )
    })
}

/// Consumes the launch URL and shows the calendar controls that match the
/// remembered external-login state. Returns that state.
pub fn apply_launch_url(
    launch_url: Option<&str>,
    store: &dyn SessionStore,
    view: &dyn View,
) -> ClientResult<bool> {
    if let Some(url) = launch_url {
        let marker = query_param(url, EXTERNAL_LOGIN_COMPLETED).filter(|v| !v.is_empty());
        if marker.is_some() {
            info!("External login completed; remembering it");
            store.set(EXTERNAL_LOGIN_COMPLETED, Value::Bool(true))?;
            view.replace_url("/");
        }
    }

    let completed = store.flag(EXTERNAL_LOGIN_COMPLETED);
    view.set_calendar_enabled(completed);
    Ok(completed)
}
