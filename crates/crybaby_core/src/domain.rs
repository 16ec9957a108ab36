//! crates/crybaby_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any platform, transport or UI.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role a user picks at sign-up time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Reads a role as stored on a profile record. Anything other than
    /// `parent` is treated as a student.
    pub fn from_stored(value: &str) -> Self {
        if value == "parent" {
            Role::Parent
        } else {
            Role::Student
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The signed-in account as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

/// The profile record stored next to every account.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub stars: i64,
}

/// Profile data written once at sign-up.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// An authenticated user together with the role from their profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// A study book: uploaded content plus its indexed metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: String,
    pub owner_id: String,
    pub subject: String,
    pub display_name: String,
    pub content_location: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a book whose content has already been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub owner_id: String,
    pub subject: String,
    pub display_name: String,
    pub content_location: String,
    pub created_at: DateTime<Utc>,
}

/// A file picked by the user for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// One recorded study session. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyLogEntry {
    pub owner_id: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub date: DateTime<Utc>,
}

/// A study session to append; the store assigns the date.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudyLog {
    pub owner_id: String,
    pub subject: String,
    pub duration_minutes: u32,
}

/// What the application shell is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    LoggedOut,
    StudentView,
    ParentView,
}

/// An entry in the owner's management list (carries what delete needs).
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedBookEntry {
    pub book_id: String,
    pub display_name: String,
    pub subject: String,
    pub content_location: String,
}

/// An entry in the read-only reading list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadableBookEntry {
    pub display_name: String,
    pub subject: String,
    pub link: String,
}

/// The two parallel renderings of a user's books.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookListing {
    pub manage: Vec<ManagedBookEntry>,
    pub read: Vec<ReadableBookEntry>,
}

impl BookListing {
    pub fn from_books(books: &[Book]) -> Self {
        let manage = books
            .iter()
            .map(|b| ManagedBookEntry {
                book_id: b.id.clone(),
                display_name: b.display_name.clone(),
                subject: b.subject.clone(),
                content_location: b.content_location.clone(),
            })
            .collect();
        let read = books
            .iter()
            .map(|b| ReadableBookEntry {
                display_name: b.display_name.clone(),
                subject: b.subject.clone(),
                link: b.content_location.clone(),
            })
            .collect();
        Self { manage, read }
    }
}

/// A single video search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResult {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
}

impl VideoResult {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// A calendar event with normalised UTC instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
}

/// Formats an instant the way browsers print `Date.toISOString()`.
pub fn to_iso_millis(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_iso_millis(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
