//! services/client/src/adapters/memory.rs
//!
//! An in-process stand-in for the managed platform: accounts, documents, files
//! and the local session cache all live in memory. Used for offline runs and as
//! the test double for every platform port. Individual operations can be told
//! to fail so the partial-failure paths can be exercised.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use crybaby_core::domain::{
    AuthUser, Book, NewBook, NewProfile, NewStudyLog, Profile, StudyLogEntry, UploadFile,
};
use crybaby_core::ports::{
    AuthProvider, AuthStateStream, BlobStorage, DatabaseService, PortError, PortResult,
    SessionStore,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use uuid::Uuid;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//=========================================================================================
// Auth
//=========================================================================================

struct Account {
    uid: String,
    password: String,
}

/// Email/password accounts held in memory.
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    state: watch::Sender<Option<AuthUser>>,
    calls: AtomicU32,
    unavailable: Mutex<Option<String>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            state,
            calls: AtomicU32::new(0),
            unavailable: Mutex::new(None),
        }
    }

    /// Number of remote-equivalent calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every following call fail with the given provider message.
    pub fn set_unavailable(&self, message: Option<&str>) {
        *lock(&self.unavailable) = message.map(str::to_string);
    }

    fn begin_call(&self) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.unavailable).as_ref() {
            Some(message) => Err(PortError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<AuthUser> {
        self.begin_call()?;
        if password.chars().count() < 6 {
            return Err(PortError::Provider(
                "Password should be at least 6 characters (auth/weak-password).".to_string(),
            ));
        }
        let user = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(email) {
                return Err(PortError::Provider(
                    "The email address is already in use (auth/email-already-in-use).".to_string(),
                ));
            }
            let uid = Uuid::new_v4().simple().to_string();
            accounts.insert(
                email.to_string(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
            AuthUser {
                uid,
                email: Some(email.to_string()),
            }
        };
        // Creating an account also signs it in.
        self.state.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthUser> {
        self.begin_call()?;
        let user = {
            let accounts = lock(&self.accounts);
            match accounts.get(email) {
                Some(account) if account.password == password => AuthUser {
                    uid: account.uid.clone(),
                    email: Some(email.to_string()),
                },
                _ => {
                    return Err(PortError::Provider(
                        "Invalid email or password (auth/invalid-credential).".to_string(),
                    ))
                }
            }
        };
        self.state.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.begin_call()?;
        self.state.send_replace(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn auth_state_changes(&self) -> AuthStateStream {
        super::auth_state_stream(self.state.subscribe())
    }
}

//=========================================================================================
// Documents
//=========================================================================================

/// Database operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbOp {
    CreateProfile,
    GetProfile,
    IncrementStars,
    AddBook,
    ListBooks,
    DeleteBook,
    AddStudyLog,
    ListStudyLogs,
}

#[derive(Default)]
struct Documents {
    profiles: HashMap<String, Profile>,
    books: Vec<Book>,
    study_logs: Vec<StudyLogEntry>,
}

/// Profiles, books and study logs held in memory.
#[derive(Default)]
pub struct MemoryDatabase {
    docs: Mutex<Documents>,
    failing: Mutex<HashSet<DbOp>>,
    calls: AtomicU32,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, op: DbOp) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: DbOp) {
        lock(&self.failing).remove(&op);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every stored book regardless of owner.
    pub fn all_books(&self) -> Vec<Book> {
        lock(&self.docs).books.clone()
    }

    fn begin(&self, op: DbOp) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing).contains(&op) {
            return Err(PortError::Unexpected(format!("{:?} is unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for MemoryDatabase {
    async fn create_profile(&self, uid: &str, profile: &NewProfile) -> PortResult<()> {
        self.begin(DbOp::CreateProfile)?;
        let mut docs = lock(&self.docs);
        let stars = docs.profiles.get(uid).map(|p| p.stars).unwrap_or(0);
        docs.profiles.insert(
            uid.to_string(),
            Profile {
                email: profile.email.clone(),
                role: profile.role,
                created_at: profile.created_at,
                stars,
            },
        );
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> PortResult<Option<Profile>> {
        self.begin(DbOp::GetProfile)?;
        Ok(lock(&self.docs).profiles.get(uid).cloned())
    }

    async fn increment_stars(&self, uid: &str) -> PortResult<()> {
        self.begin(DbOp::IncrementStars)?;
        let mut docs = lock(&self.docs);
        let profile = docs
            .profiles
            .get_mut(uid)
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", uid)))?;
        profile.stars += 1;
        Ok(())
    }

    async fn add_book(&self, book: &NewBook) -> PortResult<Book> {
        self.begin(DbOp::AddBook)?;
        let stored = Book {
            id: Uuid::new_v4().simple().to_string(),
            owner_id: book.owner_id.clone(),
            subject: book.subject.clone(),
            display_name: book.display_name.clone(),
            content_location: book.content_location.clone(),
            created_at: book.created_at,
        };
        lock(&self.docs).books.push(stored.clone());
        Ok(stored)
    }

    async fn list_books(&self, owner_id: &str) -> PortResult<Vec<Book>> {
        self.begin(DbOp::ListBooks)?;
        Ok(lock(&self.docs)
            .books
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete_book(&self, book_id: &str) -> PortResult<()> {
        self.begin(DbOp::DeleteBook)?;
        // Deleting a missing document is not an error, matching the platform.
        lock(&self.docs).books.retain(|b| b.id != book_id);
        Ok(())
    }

    async fn add_study_log(&self, entry: &NewStudyLog) -> PortResult<()> {
        self.begin(DbOp::AddStudyLog)?;
        lock(&self.docs).study_logs.push(StudyLogEntry {
            owner_id: entry.owner_id.clone(),
            subject: entry.subject.clone(),
            duration_minutes: entry.duration_minutes,
            date: Utc::now(),
        });
        Ok(())
    }

    async fn list_study_logs(&self, owner_id: &str) -> PortResult<Vec<StudyLogEntry>> {
        self.begin(DbOp::ListStudyLogs)?;
        Ok(lock(&self.docs)
            .study_logs
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// Files
//=========================================================================================

/// File content held in memory, addressed by `memory://<path>` locations.
#[derive(Default)]
pub struct MemoryBlobStorage {
    objects: Mutex<HashMap<String, UploadFile>>,
    fail_uploads: Mutex<bool>,
    fail_deletes: Mutex<bool>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        *lock(&self.fail_uploads) = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        *lock(&self.fail_deletes) = fail;
    }

    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn location_for(path: &str) -> String {
        format!("memory://{}", path)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(&self, path: &str, file: &UploadFile) -> PortResult<String> {
        if *lock(&self.fail_uploads) {
            return Err(PortError::Unexpected("storage upload unavailable".to_string()));
        }
        let location = Self::location_for(path);
        lock(&self.objects).insert(location.clone(), file.clone());
        Ok(location)
    }

    async fn delete(&self, location: &str) -> PortResult<()> {
        if *lock(&self.fail_deletes) {
            return Err(PortError::Unexpected("storage delete unavailable".to_string()));
        }
        lock(&self.objects)
            .remove(location)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Object {} not found", location)))
    }

    async fn fetch(&self, location: &str) -> PortResult<Bytes> {
        lock(&self.objects)
            .get(location)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| PortError::NotFound(format!("Object {} not found", location)))
    }
}

//=========================================================================================
// Session cache
//=========================================================================================

/// A session store that forgets everything on exit.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> PortResult<()> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}
