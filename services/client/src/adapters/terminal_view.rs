//! services/client/src/adapters/terminal_view.rs
//!
//! Draws the application to a terminal.

use crate::flows::view::{calendar_controls, panels_for};
use crybaby_core::domain::{BookListing, VideoResult, ViewState};
use crybaby_core::ports::View;

pub struct TerminalView {
    backend_url: String,
}

impl TerminalView {
    /// `backend_url` is used to turn redirect paths into something a browser can open.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
        }
    }

    fn absolute(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.backend_url, location)
        } else {
            location.to_string()
        }
    }
}

impl View for TerminalView {
    fn show_loader(&self) {
        println!("⏳ working...");
    }

    fn hide_loader(&self) {}

    fn show_state(&self, state: ViewState) {
        let panels = panels_for(state);
        if panels.loader {
            println!("⏳ loading...");
        } else if panels.auth_card {
            println!("🔐 Signed out. Use `signup` or `login`.");
        } else if panels.student_panel {
            println!("📚 Student dashboard");
        } else if panels.parent_panel {
            println!("👪 Parent dashboard");
        }
    }

    fn alert(&self, message: &str) {
        println!("[!] {}", message);
    }

    fn redirect(&self, location: &str) {
        println!("🌐 Open {} in your browser.", self.absolute(location));
    }

    fn replace_url(&self, _location: &str) {}

    fn render_books(&self, listing: &BookListing) {
        if listing.manage.is_empty() {
            println!("No books yet.");
            return;
        }
        println!("Manage books:");
        for entry in &listing.manage {
            println!(
                "  {} ({})  [delete: {} {}]",
                entry.display_name, entry.subject, entry.book_id, entry.content_location
            );
        }
        println!("Reading list:");
        for entry in &listing.read {
            println!("  {} ({}) -> {}", entry.display_name, entry.subject, entry.link);
        }
    }

    fn render_videos(&self, videos: &[VideoResult]) {
        if videos.is_empty() {
            println!("No videos found.");
        }
        for video in videos {
            println!("  ▶ {}  {}", video.title, video.watch_url());
        }
    }

    fn set_calendar_enabled(&self, enabled: bool) {
        let controls = calendar_controls(enabled);
        if controls.form_visible {
            println!("📅 Calendar connected. Use `event` to add study sessions.");
        } else if controls.login_button_visible {
            println!("📅 Calendar not connected. Use `google-login` first.");
        }
    }
}
