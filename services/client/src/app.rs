//! services/client/src/app.rs
//!
//! Wires adapters into the flows and dispatches terminal commands to them.

use crate::adapters::firebase::FirebaseEndpoints;
use crate::adapters::{
    BackendClient, FileSessionStore, FirebaseAuth, FirebaseStorage, Firestore, MemoryAuth,
    MemoryBlobStorage, MemoryDatabase,
};
use crate::commands::{Command, HELP};
use crate::config::{Config, PlatformKind};
use crate::error::ClientResult;
use crate::flows::{
    apply_launch_url, EnrichmentProxies, IdentityGateway, ResourceManager, StudyRecorder, Tutor,
};
use bytes::Bytes;
use crybaby_core::domain::UploadFile;
use crybaby_core::ports::{
    AuthProvider, BlobStorage, CalendarService, DatabaseService, SessionStore, VideoSearchService,
    View,
};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The managed-platform side: accounts, documents and files.
#[derive(Clone)]
pub struct Platform {
    pub auth: Arc<dyn AuthProvider>,
    pub db: Arc<dyn DatabaseService>,
    pub blobs: Arc<dyn BlobStorage>,
}

impl Platform {
    pub fn from_kind(kind: &PlatformKind) -> Self {
        match kind {
            PlatformKind::Memory => Self {
                auth: Arc::new(MemoryAuth::new()),
                db: Arc::new(MemoryDatabase::new()),
                blobs: Arc::new(MemoryBlobStorage::new()),
            },
            PlatformKind::Firebase(settings) => {
                let http = reqwest::Client::new();
                let auth = Arc::new(FirebaseAuth::new(
                    http.clone(),
                    settings.api_key.clone(),
                    FirebaseEndpoints::default(),
                ));
                Self {
                    db: Arc::new(Firestore::new(
                        http.clone(),
                        auth.clone(),
                        settings.project_id.clone(),
                    )),
                    blobs: Arc::new(FirebaseStorage::new(
                        http,
                        auth.clone(),
                        settings.storage_bucket.clone(),
                    )),
                    auth,
                }
            }
        }
    }
}

/// What a dispatched command asks the front end to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Say(String),
    Quit,
}

pub struct App {
    identity: Arc<IdentityGateway>,
    resources: ResourceManager,
    recorder: StudyRecorder,
    tutor: Tutor,
    enrichment: EnrichmentProxies,
    store: Arc<dyn SessionStore>,
    view: Arc<dyn View>,
}

impl App {
    pub fn new(
        platform: Platform,
        store: Arc<dyn SessionStore>,
        backend: Arc<BackendClient>,
        tutor: Tutor,
        view: Arc<dyn View>,
    ) -> Self {
        let videos: Arc<dyn VideoSearchService> = backend.clone();
        let calendar: Arc<dyn CalendarService> = backend;
        Self {
            identity: Arc::new(IdentityGateway::new(
                platform.auth,
                platform.db.clone(),
                view.clone(),
            )),
            resources: ResourceManager::new(platform.db.clone(), platform.blobs, view.clone()),
            recorder: StudyRecorder::new(platform.db, view.clone()),
            tutor,
            enrichment: EnrichmentProxies::new(videos, calendar, view.clone()),
            store,
            view,
        }
    }

    pub fn from_config(config: &Config, view: Arc<dyn View>) -> Self {
        let backend = Arc::new(BackendClient::new(config.backend_url.clone()));
        let tutor = Tutor::standard(
            &config.direct_provider,
            backend.clone(),
            config.tutor_fallback,
        );
        info!("Tutor strategies: {:?}", tutor.strategy_names());
        Self::new(
            Platform::from_kind(&config.platform),
            Arc::new(FileSessionStore::open(config.session_path.clone())),
            backend,
            tutor,
            view,
        )
    }

    /// Consumes the launch URL and starts the session observer.
    pub fn start(
        &self,
        launch_url: Option<&str>,
        cancel: CancellationToken,
    ) -> ClientResult<JoinHandle<()>> {
        apply_launch_url(launch_url, self.store.as_ref(), self.view.as_ref())?;
        Ok(self.identity.clone().observe_session(cancel))
    }

    fn owner_id(&self) -> Option<String> {
        self.identity.current_user().map(|u| u.uid)
    }

    pub async fn dispatch(&self, command: Command) -> ClientResult<Outcome> {
        let owner = self.owner_id();
        match command {
            Command::SignUp {
                email,
                password,
                role,
            } => {
                self.identity.sign_up(&email, &password, role).await?;
            }
            Command::Login { email, password } => {
                self.identity.sign_in(&email, &password).await?;
            }
            Command::Logout => self.identity.sign_out().await?,
            Command::Upload { path, subject } => {
                let file = read_upload(&path).await;
                self.resources
                    .upload(owner.as_deref(), file, &subject)
                    .await?;
            }
            Command::Books => {
                self.resources.list(owner.as_deref()).await?;
            }
            Command::Delete {
                book_id,
                content_location,
            } => {
                self.resources
                    .delete(owner.as_deref(), &book_id, &content_location)
                    .await?;
            }
            Command::Ask(prompt) => {
                return Ok(Outcome::Say(self.tutor.get_tutor_response(&prompt).await));
            }
            Command::Videos(query) => {
                self.enrichment.search_videos(&query).await?;
            }
            Command::Event {
                start,
                end,
                summary,
                description,
            } => {
                self.enrichment
                    .create_calendar_event(&summary, &description, &start, &end)
                    .await?;
            }
            Command::Study { subject, minutes } => {
                self.recorder
                    .log_study(owner.as_deref(), &subject, minutes)
                    .await;
            }
            Command::Star => {
                self.recorder.add_star(owner.as_deref()).await?;
                return Ok(Outcome::Say("⭐ Star added!".to_string()));
            }
            Command::Progress(child_id) => {
                let entries = self.recorder.child_progress(&child_id).await?;
                if entries.is_empty() {
                    return Ok(Outcome::Say("No study sessions logged yet.".to_string()));
                }
                let lines: Vec<String> = entries
                    .iter()
                    .map(|e| {
                        format!(
                            "  {}  {} ({} min)",
                            e.date.format("%Y-%m-%d %H:%M"),
                            e.subject,
                            e.duration_minutes
                        )
                    })
                    .collect();
                return Ok(Outcome::Say(lines.join("\n")));
            }
            Command::GoogleLogin => self.enrichment.begin_external_login(),
            Command::Help => return Ok(Outcome::Say(HELP.to_string())),
            Command::Quit => return Ok(Outcome::Quit),
        }
        Ok(Outcome::Done)
    }
}

/// Reads a file for upload. An unreadable file counts as no file selected.
async fn read_upload(path: &Path) -> Option<UploadFile> {
    let name = path.file_name()?.to_string_lossy().into_owned();
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(UploadFile {
            content_type: content_type_for(&name).to_string(),
            name,
            bytes: Bytes::from(bytes),
        }),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("epub") => "application/epub+zip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
