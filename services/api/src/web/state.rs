//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{OAuthClient, TokenFile};
use crate::config::Config;
use crybaby_core::ports::{CalendarProvider, GenerativeModel, VideoSearchProvider};
use std::sync::Arc;

/// Everything the calendar endpoints need. Absent when no OAuth client is configured.
#[derive(Clone)]
pub struct CalendarAccess {
    pub oauth: Arc<OAuthClient>,
    pub tokens: Arc<TokenFile>,
    pub calendar: Arc<dyn CalendarProvider>,
}

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<dyn GenerativeModel>,
    pub videos: Arc<dyn VideoSearchProvider>,
    pub calendar: Option<CalendarAccess>,
    /// Anti-CSRF value sent with the consent request and checked on the callback.
    /// Generated once per process.
    pub oauth_state: String,
}
