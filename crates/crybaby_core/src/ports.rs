//! crates/crybaby_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture: the managed
//! platform, the backend proxy, the external providers and the UI all sit
//! behind one of them.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

use crate::domain::{
    AuthUser, Book, BookListing, CalendarEvent, NewBook, NewProfile, NewStudyLog, Profile,
    StudyLogEntry, UploadFile, VideoResult, ViewState,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., platform, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The remote side wants the user to (re-)authenticate.
    #[error("{0}")]
    Unauthorized(String),
    /// A message from the platform meant to be shown to the user as-is.
    #[error("{0}")]
    Provider(String),
    /// A well-formed `{error}` payload returned by a remote endpoint.
    #[error("Remote error: {0}")]
    Remote(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Auth state changes. Yields the current user first, then every change.
pub type AuthStateStream = Pin<Box<dyn Stream<Item = Option<AuthUser>> + Send>>;

//=========================================================================================
// Platform Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthUser>;

    async fn sign_out(&self) -> PortResult<()>;

    fn current_user(&self) -> Option<AuthUser>;

    fn auth_state_changes(&self) -> AuthStateStream;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Profiles ---
    async fn create_profile(&self, uid: &str, profile: &NewProfile) -> PortResult<()>;

    async fn get_profile(&self, uid: &str) -> PortResult<Option<Profile>>;

    /// Atomically adds one star to the profile's counter.
    async fn increment_stars(&self, uid: &str) -> PortResult<()>;

    // --- Books ---
    async fn add_book(&self, book: &NewBook) -> PortResult<Book>;

    async fn list_books(&self, owner_id: &str) -> PortResult<Vec<Book>>;

    async fn delete_book(&self, book_id: &str) -> PortResult<()>;

    // --- Study logs ---
    /// Appends a study log; the store assigns the timestamp.
    async fn add_study_log(&self, entry: &NewStudyLog) -> PortResult<()>;

    async fn list_study_logs(&self, owner_id: &str) -> PortResult<Vec<StudyLogEntry>>;
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores the file under `path` and returns a location it can be fetched from.
    async fn upload(&self, path: &str, file: &UploadFile) -> PortResult<String>;

    async fn delete(&self, location: &str) -> PortResult<()>;

    async fn fetch(&self, location: &str) -> PortResult<Bytes>;
}

/// Small persistent key/value cache for UI flags.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;

    /// Reads a boolean flag; anything missing or non-truthy is `false`.
    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::Null) | None => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }
}

//=========================================================================================
// UI Port
//=========================================================================================

/// Everything the orchestration layer is allowed to do to the screen.
pub trait View: Send + Sync {
    fn show_loader(&self);

    fn hide_loader(&self);

    fn show_state(&self, state: ViewState);

    /// A blocking notification.
    fn alert(&self, message: &str);

    fn redirect(&self, location: &str);

    fn replace_url(&self, location: &str);

    fn render_books(&self, listing: &BookListing);

    fn render_videos(&self, videos: &[VideoResult]);

    fn set_calendar_enabled(&self, enabled: bool);
}

//=========================================================================================
// Backend Proxy Ports (client side)
//=========================================================================================

/// One way of getting an answer for the tutor.
#[async_trait]
pub trait TutorStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// The canned reply used when this strategy is the last one to fail.
    fn apology(&self) -> &str;

    async fn ask(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait VideoSearchService: Send + Sync {
    async fn search_videos(&self, query: &str) -> PortResult<Vec<VideoResult>>;
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn create_event(&self, event: &CalendarEvent) -> PortResult<()>;
}

//=========================================================================================
// External Provider Ports (backend side)
//=========================================================================================

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the provider's raw response document.
    async fn generate_content(&self, prompt: &str) -> PortResult<Value>;
}

#[async_trait]
pub trait VideoSearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> PortResult<Value>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Inserts into the primary calendar. `Unauthorized` means no usable token.
    async fn insert_event(&self, event: &CalendarEvent) -> PortResult<Value>;
}
