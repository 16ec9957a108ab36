pub mod domain;
pub mod ports;

pub use domain::{
    AuthUser, Book, BookListing, CalendarEvent, Identity, ManagedBookEntry, NewBook, NewProfile,
    NewStudyLog, Profile, ReadableBookEntry, Role, StudyLogEntry, UploadFile, VideoResult,
    ViewState,
};
pub use ports::{
    AuthProvider, AuthStateStream, BlobStorage, CalendarProvider, CalendarService,
    DatabaseService, GenerativeModel, PortError, PortResult, SessionStore, TutorStrategy,
    VideoSearchProvider, VideoSearchService, View,
};
