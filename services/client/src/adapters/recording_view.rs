//! services/client/src/adapters/recording_view.rs
//!
//! A `View` that records every call instead of drawing anything.

use crybaby_core::domain::{BookListing, VideoResult, ViewState};
use crybaby_core::ports::View;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    LoaderShown,
    LoaderHidden,
    State(ViewState),
    Alert(String),
    Redirect(String),
    ReplaceUrl(String),
    Books(BookListing),
    Videos(Vec<VideoResult>),
    CalendarEnabled(bool),
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Redirect(to) => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<ViewState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn last_state(&self) -> Option<ViewState> {
        self.states().last().copied()
    }

    pub fn last_books(&self) -> Option<BookListing> {
        self.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Books(listing) => Some(listing.clone()),
            _ => None,
        })
    }

    pub fn last_videos(&self) -> Option<Vec<VideoResult>> {
        self.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Videos(videos) => Some(videos.clone()),
            _ => None,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ViewEvent>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn push(&self, event: ViewEvent) {
        self.lock().push(event);
    }
}

impl View for RecordingView {
    fn show_loader(&self) {
        self.push(ViewEvent::LoaderShown);
    }

    fn hide_loader(&self) {
        self.push(ViewEvent::LoaderHidden);
    }

    fn show_state(&self, state: ViewState) {
        self.push(ViewEvent::State(state));
    }

    fn alert(&self, message: &str) {
        self.push(ViewEvent::Alert(message.to_string()));
    }

    fn redirect(&self, location: &str) {
        self.push(ViewEvent::Redirect(location.to_string()));
    }

    fn replace_url(&self, location: &str) {
        self.push(ViewEvent::ReplaceUrl(location.to_string()));
    }

    fn render_books(&self, listing: &BookListing) {
        self.push(ViewEvent::Books(listing.clone()));
    }

    fn render_videos(&self, videos: &[VideoResult]) {
        self.push(ViewEvent::Videos(videos.to_vec()));
    }

    fn set_calendar_enabled(&self, enabled: bool) {
        self.push(ViewEvent::CalendarEnabled(enabled));
    }
}
