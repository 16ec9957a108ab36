//! services/client/tests/flows.rs
//!
//! End-to-end behaviour of the client flows against the in-memory platform and
//! a recording view.

use async_trait::async_trait;
use bytes::Bytes;
use client_lib::adapters::{
    BackendClient, DbOp, FileSessionStore, MemoryAuth, MemoryBlobStorage, MemoryDatabase,
    RecordingView, ViewEvent,
};
use client_lib::app::{App, Outcome, Platform};
use client_lib::commands::Command;
use client_lib::error::ClientError;
use client_lib::flows::enrichment::{EVENT_FAILED, EVENT_MISSING_FIELDS, EVENT_OK};
use client_lib::flows::identity::{SIGN_IN_INVALID, SIGN_UP_INVALID, SIGN_UP_OK};
use client_lib::flows::resources::{
    DELETE_FAILED, DELETE_OK, UPLOAD_FAILED, UPLOAD_MISSING_INPUT, UPLOAD_OK,
};
use client_lib::flows::recorder::RECORD_LOGIN_REQUIRED;
use client_lib::flows::{
    EnrichmentProxies, IdentityGateway, ResourceManager, StudyRecorder, Tutor,
};
use crybaby_core::domain::{AuthUser, CalendarEvent, Role, UploadFile, VideoResult, ViewState};
use crybaby_core::ports::{
    BlobStorage, CalendarService, DatabaseService, PortError, PortResult, VideoSearchService,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Harness {
    auth: Arc<MemoryAuth>,
    db: Arc<MemoryDatabase>,
    blobs: Arc<MemoryBlobStorage>,
    view: Arc<RecordingView>,
}

impl Harness {
    fn new() -> Self {
        Self {
            auth: Arc::new(MemoryAuth::new()),
            db: Arc::new(MemoryDatabase::new()),
            blobs: Arc::new(MemoryBlobStorage::new()),
            view: Arc::new(RecordingView::new()),
        }
    }

    fn gateway(&self) -> Arc<IdentityGateway> {
        Arc::new(IdentityGateway::new(
            self.auth.clone(),
            self.db.clone(),
            self.view.clone(),
        ))
    }

    fn resources(&self) -> ResourceManager {
        ResourceManager::new(self.db.clone(), self.blobs.clone(), self.view.clone())
    }

    fn recorder(&self) -> StudyRecorder {
        StudyRecorder::new(self.db.clone(), self.view.clone())
    }
}

fn pdf(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4 fractions"),
    }
}

/// Waits until the view's latest state is `expected`.
async fn wait_for_state(view: &RecordingView, expected: ViewState) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while view.last_state() != Some(expected) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("view never reached {:?}: {:?}", expected, view.states()));
}

// --- Identity ---

#[tokio::test]
async fn short_password_sign_up_makes_no_remote_call() {
    let h = Harness::new();
    let gateway = h.gateway();

    let err = gateway
        .sign_up("kid@example.com", "12345", Role::Student)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(h.auth.call_count(), 0);
    assert_eq!(h.db.call_count(), 0);
    assert_eq!(h.view.alerts(), vec![SIGN_UP_INVALID.to_string()]);
}

#[tokio::test]
async fn short_password_is_counted_in_characters() {
    let h = Harness::new();

    // Three characters, six bytes.
    let err = h
        .gateway()
        .sign_up("kid@example.com", "ééé", Role::Student)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(h.auth.call_count(), 0);
    assert_eq!(h.view.alerts(), vec![SIGN_UP_INVALID.to_string()]);

    h.view.clear();
    h.gateway()
        .sign_up("kid@example.com", "éééééé", Role::Student)
        .await
        .unwrap();
    assert_eq!(h.view.alerts(), vec![SIGN_UP_OK.to_string()]);
}

#[tokio::test]
async fn blank_sign_in_is_rejected_locally() {
    let h = Harness::new();
    assert!(h.gateway().sign_in("  ", "secret1").await.is_err());
    assert_eq!(h.auth.call_count(), 0);
    assert_eq!(h.view.alerts(), vec![SIGN_IN_INVALID.to_string()]);
}

#[tokio::test]
async fn sign_up_scenario_resolves_to_student_view() {
    let h = Harness::new();
    let gateway = h.gateway();
    let cancel = CancellationToken::new();
    let observer = gateway.clone().observe_session(cancel.clone());

    wait_for_state(&h.view, ViewState::LoggedOut).await;
    assert_eq!(h.view.states().first(), Some(&ViewState::Loading));

    let identity = gateway
        .sign_up(" kid@example.com ", "secret1", Role::Student)
        .await
        .unwrap();
    assert_eq!(identity.email, "kid@example.com");
    wait_for_state(&h.view, ViewState::StudentView).await;

    let profile = h.db.get_profile(&identity.id).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Student);
    assert_eq!(profile.stars, 0);
    assert!(h.view.alerts().contains(&SIGN_UP_OK.to_string()));

    // The loader brackets the remote calls.
    let events = h.view.events();
    let shown = events.iter().position(|e| *e == ViewEvent::LoaderShown).unwrap();
    let hidden = events.iter().position(|e| *e == ViewEvent::LoaderHidden).unwrap();
    assert!(shown < hidden);

    cancel.cancel();
    observer.await.unwrap();
}

#[tokio::test]
async fn parent_sign_in_shows_parent_view_and_sign_out_logs_out() {
    let h = Harness::new();
    let gateway = h.gateway();
    gateway
        .sign_up("mum@example.com", "secret1", Role::Parent)
        .await
        .unwrap();
    gateway.sign_out().await.unwrap();

    let cancel = CancellationToken::new();
    let observer = gateway.clone().observe_session(cancel.clone());
    wait_for_state(&h.view, ViewState::LoggedOut).await;

    gateway.sign_in("mum@example.com", "secret1").await.unwrap();
    wait_for_state(&h.view, ViewState::ParentView).await;

    gateway.sign_out().await.unwrap();
    wait_for_state(&h.view, ViewState::LoggedOut).await;
    assert!(gateway.current_user().is_none());

    cancel.cancel();
    observer.await.unwrap();
}

#[tokio::test]
async fn provider_failures_are_alerted_verbatim_and_hide_the_loader() {
    let h = Harness::new();
    let gateway = h.gateway();

    let err = gateway.sign_in("nobody@example.com", "secret1").await.unwrap_err();
    assert!(matches!(err, ClientError::Port(PortError::Provider(_))));
    assert_eq!(
        h.view.alerts(),
        vec!["Invalid email or password (auth/invalid-credential).".to_string()]
    );
    assert_eq!(h.view.events().last(), Some(&ViewEvent::Alert(
        "Invalid email or password (auth/invalid-credential).".to_string()
    )));
    assert!(h.view.events().contains(&ViewEvent::LoaderHidden));
}

#[tokio::test]
async fn profile_write_failure_alerts_the_message() {
    let h = Harness::new();
    h.db.fail_on(DbOp::CreateProfile);

    let err = h
        .gateway()
        .sign_up("kid@example.com", "secret1", Role::Student)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Port(_)));
    assert!(!h.view.alerts().contains(&SIGN_UP_OK.to_string()));
    assert_eq!(h.view.alerts().len(), 1);
}

#[tokio::test]
async fn profile_lookup_failure_resolves_to_logged_out() {
    let h = Harness::new();
    let gateway = h.gateway();
    let user = AuthUser {
        uid: "u1".to_string(),
        email: None,
    };

    assert_eq!(gateway.resolve_view_state(None).await, ViewState::LoggedOut);
    assert_eq!(
        gateway.resolve_view_state(Some(&user)).await,
        ViewState::StudentView
    );
    h.db.fail_on(DbOp::GetProfile);
    assert_eq!(
        gateway.resolve_view_state(Some(&user)).await,
        ViewState::LoggedOut
    );
}

// --- Resources ---

#[tokio::test]
async fn upload_then_list_shows_exactly_the_new_book() {
    let h = Harness::new();
    let resources = h.resources();

    let book = resources
        .upload(Some("u1"), Some(pdf("fractions.pdf")), " math ")
        .await
        .unwrap();

    assert_eq!(book.owner_id, "u1");
    assert_eq!(book.subject, "math");
    assert_eq!(
        book.content_location,
        MemoryBlobStorage::location_for("books/u1/math/fractions.pdf")
    );
    assert_eq!(h.view.alerts(), vec![UPLOAD_OK.to_string()]);

    let listing = h.view.last_books().unwrap();
    assert_eq!(listing.manage.len(), 1);
    assert_eq!(listing.read.len(), 1);
    assert_eq!(listing.manage[0].book_id, book.id);
    assert_eq!(listing.read[0].link, book.content_location);
    assert_eq!(listing.read[0].display_name, "fractions.pdf");

    let content = h.blobs.fetch(&book.content_location).await.unwrap();
    assert_eq!(content, Bytes::from_static(b"%PDF-1.4 fractions"));
}

#[tokio::test]
async fn upload_without_file_or_subject_makes_no_remote_call() {
    let h = Harness::new();
    let resources = h.resources();

    assert!(resources.upload(Some("u1"), None, "math").await.is_err());
    assert!(resources
        .upload(Some("u1"), Some(pdf("a.pdf")), "   ")
        .await
        .is_err());
    assert!(resources.upload(None, Some(pdf("a.pdf")), "math").await.is_err());

    assert_eq!(h.db.call_count(), 0);
    assert_eq!(h.blobs.object_count(), 0);
    assert_eq!(h.view.alerts(), vec![UPLOAD_MISSING_INPUT.to_string(); 3]);
}

#[tokio::test]
async fn failed_content_write_skips_metadata() {
    let h = Harness::new();
    h.blobs.fail_uploads(true);

    let err = h
        .resources()
        .upload(Some("u1"), Some(pdf("a.pdf")), "math")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Port(_)));
    assert_eq!(h.db.call_count(), 0);
    assert_eq!(h.view.alerts(), vec![UPLOAD_FAILED.to_string()]);
}

#[tokio::test]
async fn failed_metadata_write_reports_the_orphaned_content() {
    let h = Harness::new();
    h.db.fail_on(DbOp::AddBook);

    let err = h
        .resources()
        .upload(Some("u1"), Some(pdf("a.pdf")), "math")
        .await
        .unwrap_err();

    match err {
        ClientError::Incomplete { dangling, .. } => {
            assert_eq!(dangling, MemoryBlobStorage::location_for("books/u1/math/a.pdf"));
        }
        other => panic!("expected Incomplete, got {:?}", other),
    }
    assert_eq!(h.blobs.object_count(), 1);
    assert!(h.db.all_books().is_empty());
    assert_eq!(h.view.alerts(), vec![UPLOAD_FAILED.to_string()]);
}

#[tokio::test]
async fn content_delete_failure_leaves_content_retrievable() {
    let h = Harness::new();
    let resources = h.resources();
    let book = resources
        .upload(Some("u1"), Some(pdf("a.pdf")), "math")
        .await
        .unwrap();
    h.view.clear();
    h.blobs.fail_deletes(true);

    let err = resources
        .delete(Some("u1"), &book.id, &book.content_location)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Incomplete { .. }));
    assert!(h.db.all_books().is_empty());
    assert!(h.blobs.fetch(&book.content_location).await.is_ok());
    assert_eq!(h.view.alerts(), vec![DELETE_FAILED.to_string()]);
}

#[tokio::test]
async fn delete_removes_both_halves_and_refreshes() {
    let h = Harness::new();
    let resources = h.resources();
    let keep = resources
        .upload(Some("u1"), Some(pdf("keep.pdf")), "math")
        .await
        .unwrap();
    let gone = resources
        .upload(Some("u1"), Some(pdf("gone.pdf")), "math")
        .await
        .unwrap();
    h.view.clear();

    resources
        .delete(Some("u1"), &gone.id, &gone.content_location)
        .await
        .unwrap();

    assert_eq!(h.view.alerts(), vec![DELETE_OK.to_string()]);
    let listing = h.view.last_books().unwrap();
    assert_eq!(listing.manage.len(), 1);
    assert_eq!(listing.manage[0].book_id, keep.id);
    assert!(h.blobs.fetch(&gone.content_location).await.is_err());
}

#[tokio::test]
async fn failed_refresh_does_not_undo_a_completed_upload_or_delete() {
    let h = Harness::new();
    let resources = h.resources();
    h.db.fail_on(DbOp::ListBooks);

    let book = resources
        .upload(Some("u1"), Some(pdf("a.pdf")), "math")
        .await
        .unwrap();
    assert_eq!(h.db.all_books(), vec![book.clone()]);
    assert_eq!(h.view.alerts(), vec![UPLOAD_OK.to_string()]);
    assert!(h.view.last_books().is_none());

    h.view.clear();
    resources
        .delete(Some("u1"), &book.id, &book.content_location)
        .await
        .unwrap();
    assert!(h.db.all_books().is_empty());
    assert_eq!(h.view.alerts(), vec![DELETE_OK.to_string()]);
}

#[tokio::test]
async fn list_and_delete_without_identity_do_nothing() {
    let h = Harness::new();
    let resources = h.resources();
    assert!(resources.list(None).await.unwrap().is_empty());
    resources.delete(None, "b1", "memory://x").await.unwrap();
    assert_eq!(h.db.call_count(), 0);
    assert!(h.view.events().is_empty());
}

#[tokio::test]
async fn books_are_listed_per_owner() {
    let h = Harness::new();
    let resources = h.resources();
    resources
        .upload(Some("u1"), Some(pdf("mine.pdf")), "math")
        .await
        .unwrap();
    resources
        .upload(Some("u2"), Some(pdf("theirs.pdf")), "math")
        .await
        .unwrap();

    let books = resources.list(Some("u1")).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].display_name, "mine.pdf");
}

// --- Recorder ---

#[tokio::test]
async fn study_logs_and_stars_are_recorded() {
    let h = Harness::new();
    let identity = h
        .gateway()
        .sign_up("kid@example.com", "secret1", Role::Student)
        .await
        .unwrap();
    let recorder = h.recorder();

    recorder.log_study(Some(identity.id.as_str()), "math", 25).await;
    recorder.add_star(Some(identity.id.as_str())).await.unwrap();
    recorder.add_star(Some(identity.id.as_str())).await.unwrap();

    let progress = recorder.child_progress(&identity.id).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].subject, "math");
    assert_eq!(progress[0].duration_minutes, 25);

    let profile = h.db.get_profile(&identity.id).await.unwrap().unwrap();
    assert_eq!(profile.stars, 2);
}

#[tokio::test]
async fn study_log_failures_are_dropped() {
    let h = Harness::new();
    h.db.fail_on(DbOp::AddStudyLog);
    let recorder = h.recorder();

    recorder.log_study(Some("u1"), "math", 10).await;

    h.db.recover(DbOp::AddStudyLog);
    assert!(recorder.child_progress("u1").await.unwrap().is_empty());
    assert!(recorder.add_star(Some("missing")).await.is_err());
    assert!(h.view.alerts().is_empty());
}

#[tokio::test]
async fn recording_without_an_owner_writes_nothing() {
    let h = Harness::new();
    let recorder = h.recorder();

    recorder.log_study(Some(""), "math", 10).await;
    recorder.log_study(None, "math", 10).await;
    let err = recorder.add_star(None).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(h.db.call_count(), 0);
    assert!(recorder.child_progress("").await.unwrap().is_empty());
    assert_eq!(h.view.alerts(), vec![RECORD_LOGIN_REQUIRED.to_string(); 3]);
}

#[tokio::test]
async fn logged_out_study_and_star_commands_tell_the_user() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let platform = Platform {
        auth: h.auth.clone(),
        db: h.db.clone(),
        blobs: h.blobs.clone(),
    };
    let app = App::new(
        platform,
        Arc::new(FileSessionStore::open(dir.path().join("session.json"))),
        Arc::new(BackendClient::new("http://127.0.0.1:9")),
        Tutor::new(Vec::new()),
        h.view.clone(),
    );

    let study = Command::Study {
        subject: "math".to_string(),
        minutes: 10,
    };
    assert_eq!(app.dispatch(study).await.unwrap(), Outcome::Done);
    assert!(app.dispatch(Command::Star).await.is_err());

    assert_eq!(h.db.call_count(), 0);
    assert_eq!(h.view.alerts(), vec![RECORD_LOGIN_REQUIRED.to_string(); 2]);
}

// --- Enrichment ---

struct ScriptedBackend {
    calendar: PortResult<()>,
    videos: PortResult<Vec<VideoResult>>,
    events: Mutex<Vec<CalendarEvent>>,
}

impl ScriptedBackend {
    fn new(calendar: PortResult<()>, videos: PortResult<Vec<VideoResult>>) -> Arc<Self> {
        Arc::new(Self {
            calendar,
            videos,
            events: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CalendarService for ScriptedBackend {
    async fn create_event(&self, event: &CalendarEvent) -> PortResult<()> {
        self.events.lock().unwrap().push(event.clone());
        self.calendar.clone()
    }
}

#[async_trait]
impl VideoSearchService for ScriptedBackend {
    async fn search_videos(&self, _query: &str) -> PortResult<Vec<VideoResult>> {
        self.videos.clone()
    }
}

fn proxies(backend: &Arc<ScriptedBackend>, view: &Arc<RecordingView>) -> EnrichmentProxies {
    EnrichmentProxies::new(backend.clone(), backend.clone(), view.clone())
}

fn video(id: &str) -> VideoResult {
    VideoResult {
        video_id: id.to_string(),
        title: format!("Video {}", id),
        thumbnail_url: format!("https://i.ytimg.com/vi/{}/default.jpg", id),
    }
}

#[tokio::test]
async fn unauthorized_calendar_redirects_exactly_once() {
    let backend = ScriptedBackend::new(
        Err(PortError::Unauthorized("Please log in with Google first.".into())),
        Ok(vec![]),
    );
    let view = Arc::new(RecordingView::new());

    let result = proxies(&backend, &view)
        .create_calendar_event("Math", "", "2024-05-01T10:00", "2024-05-01T11:00")
        .await;

    assert!(result.is_err());
    assert_eq!(view.redirects(), vec!["/login/google".to_string()]);
    assert_eq!(
        view.alerts(),
        vec!["Please log in with Google first.".to_string()]
    );
    assert!(!view.alerts().contains(&EVENT_OK.to_string()));
}

#[tokio::test]
async fn calendar_event_validation_and_outcomes() {
    let view = Arc::new(RecordingView::new());
    let ok = ScriptedBackend::new(Ok(()), Ok(vec![]));
    let proxies_ok = proxies(&ok, &view);

    assert!(proxies_ok
        .create_calendar_event("", "", "2024-05-01T10:00", "2024-05-01T11:00")
        .await
        .is_err());
    assert!(proxies_ok
        .create_calendar_event("Math", "", "soon", "later")
        .await
        .is_err());
    proxies_ok
        .create_calendar_event(
            "Math",
            "chapter 3",
            "2024-05-01T10:00:00Z",
            "2024-05-01T11:00:00Z",
        )
        .await
        .unwrap();

    assert_eq!(
        view.alerts(),
        vec![
            EVENT_MISSING_FIELDS.to_string(),
            EVENT_FAILED.to_string(),
            EVENT_OK.to_string()
        ]
    );
    let sent = ok.events.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].description, "chapter 3");
    assert!(view.redirects().is_empty());

    let down = ScriptedBackend::new(Err(PortError::Remote("boom".into())), Ok(vec![]));
    view.clear();
    assert!(proxies(&down, &view)
        .create_calendar_event("Math", "", "2024-05-01T10:00", "2024-05-01T11:00")
        .await
        .is_err());
    assert_eq!(view.alerts(), vec![EVENT_FAILED.to_string()]);
    assert!(view.redirects().is_empty());
}

#[tokio::test]
async fn video_search_replaces_results_and_ignores_failures() {
    let view = Arc::new(RecordingView::new());

    let first = ScriptedBackend::new(Ok(()), Ok(vec![video("a"), video("b")]));
    proxies(&first, &view).search_videos("fractions").await.unwrap();
    let second = ScriptedBackend::new(Ok(()), Ok(vec![video("c")]));
    proxies(&second, &view).search_videos("decimals").await.unwrap();
    assert_eq!(view.last_videos(), Some(vec![video("c")]));

    let failing = ScriptedBackend::new(Ok(()), Err(PortError::Remote("quota".into())));
    assert!(proxies(&failing, &view).search_videos("x").await.is_err());
    assert_eq!(view.last_videos(), Some(vec![video("c")]));
    assert!(view.alerts().is_empty());

    proxies(&failing, &view).search_videos("").await.unwrap();
    proxies(&failing, &view).begin_external_login();
    assert_eq!(view.redirects(), vec!["/login/google".to_string()]);
}

#[tokio::test]
async fn whitespace_query_is_still_searched() {
    let view = Arc::new(RecordingView::new());
    let backend = ScriptedBackend::new(Ok(()), Ok(vec![video("a")]));

    let found = proxies(&backend, &view).search_videos("  ").await.unwrap();

    assert_eq!(found, vec![video("a")]);
    assert_eq!(view.last_videos(), Some(vec![video("a")]));
}
