//! services/client/src/flows/recorder.rs
//!
//! Study-session logging, reward stars and the parent's progress view.

use crate::error::{ClientError, ClientResult};
use crybaby_core::domain::{NewStudyLog, StudyLogEntry};
use crybaby_core::ports::{DatabaseService, View};
use std::sync::Arc;
use tracing::{info, warn};

pub const RECORD_LOGIN_REQUIRED: &str = "Please log in to record study time.";

pub struct StudyRecorder {
    db: Arc<dyn DatabaseService>,
    view: Arc<dyn View>,
}

impl StudyRecorder {
    pub fn new(db: Arc<dyn DatabaseService>, view: Arc<dyn View>) -> Self {
        Self { db, view }
    }

    /// Alerts and returns `None` when there is no signed-in owner.
    fn require_owner<'a>(&self, owner_id: Option<&'a str>) -> Option<&'a str> {
        let owner = owner_id.filter(|o| !o.is_empty());
        if owner.is_none() {
            self.view.alert(RECORD_LOGIN_REQUIRED);
        }
        owner
    }

    /// Appends a study log. Remote failures are logged and dropped; only a
    /// missing owner is reported, and nothing is written in that case.
    pub async fn log_study(&self, owner_id: Option<&str>, subject: &str, duration_minutes: u32) {
        let Some(owner_id) = self.require_owner(owner_id) else {
            return;
        };
        let entry = NewStudyLog {
            owner_id: owner_id.to_string(),
            subject: subject.to_string(),
            duration_minutes,
        };
        match self.db.add_study_log(&entry).await {
            Ok(()) => info!(
                "Logged {} minutes of {} for {}",
                duration_minutes, subject, owner_id
            ),
            Err(e) => warn!("Dropping study log for {}: {}", owner_id, e),
        }
    }

    /// Atomic +1 on the owner's star counter.
    pub async fn add_star(&self, owner_id: Option<&str>) -> ClientResult<()> {
        let Some(owner_id) = self.require_owner(owner_id) else {
            return Err(ClientError::Validation(RECORD_LOGIN_REQUIRED.to_string()));
        };
        self.db.increment_stars(owner_id).await?;
        info!("Added a star for {}", owner_id);
        Ok(())
    }

    pub async fn child_progress(&self, child_id: &str) -> ClientResult<Vec<StudyLogEntry>> {
        Ok(self.db.list_study_logs(child_id).await?)
    }
}
