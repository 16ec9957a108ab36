//! services/client/src/adapters/session_file.rs
//!
//! A `SessionStore` persisted as a single JSON object on disk, so UI flags
//! survive restarts the way browser local storage does.

use crybaby_core::ports::{PortError, PortResult, SessionStore};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl FileSessionStore {
    /// Opens the store at `path`. A missing file starts empty; an unreadable or
    /// corrupt one is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("Could not read session file {}: {}", path.display(), e);
                Map::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Map<String, Value>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PortError::Unexpected(format!("create {}: {}", parent.display(), e)))?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| PortError::Unexpected(format!("write {}: {}", self.path.display(), e)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
