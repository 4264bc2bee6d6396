use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cookie::{CookieConfig, StoredCookie};
use crate::models::{AuthResponse, AuthUser};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Cookie jar file name in the data directory
const COOKIE_FILE: &str = "cookies.txt";

/// The two persisted surfaces of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Durable record read by the application
    Session,
    /// Cookie mirror read by the route guard
    Cookies,
}

impl Slot {
    fn file_name(&self) -> &'static str {
        match self {
            Slot::Session => SESSION_FILE,
            Slot::Cookies => COOKIE_FILE,
        }
    }
}

/// Raw storage underneath a `SessionStore`.
pub trait SessionBackend: Send + Sync {
    fn read(&self, slot: Slot) -> io::Result<Option<String>>;
    fn write(&self, slot: Slot, contents: &str) -> io::Result<()>;
    fn remove(&self, slot: Slot) -> io::Result<()>;
}

/// Stores each slot as a file in a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }
}

impl SessionBackend for FileBackend {
    fn read(&self, slot: Slot) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write to a temp file in the same directory and rename it over the
    /// target, so readers see either the old contents or the new ones.
    /// Temp files are created owner-only (0600).
    fn write(&self, slot: Slot, contents: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path(slot)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, slot: Slot) -> io::Result<()> {
        match std::fs::remove_file(self.path(slot)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<Slot, String>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionBackend for MemoryBackend {
    fn read(&self, slot: Slot) -> io::Result<Option<String>> {
        Ok(self.slots().get(&slot).cloned())
    }

    fn write(&self, slot: Slot, contents: &str) -> io::Result<()> {
        self.slots().insert(slot, contents.to_string());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> io::Result<()> {
        self.slots().remove(&slot);
        Ok(())
    }
}

/// The persisted session record. Tokens and user are written as one
/// document so they can never be observed apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub renewed_at: Option<DateTime<Utc>>,
}

impl SessionData {
    fn is_complete(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Result of inspecting the durable record
#[derive(Debug, Clone, PartialEq)]
pub enum SessionHealth {
    Active(AuthUser),
    Absent,
    /// Present but unreadable or incomplete
    Corrupted,
}

/// Durable session storage with a cookie mirror of the access token.
///
/// Reads never fail: anything missing or malformed is reported as "no
/// session". Writes are best-effort and logged when they fail.
pub struct SessionStore {
    backend: Option<Arc<dyn SessionBackend>>,
    lock: RwLock<()>,
    cookie: CookieConfig,
    clear_listeners: Mutex<Vec<ClearListener>>,
}

type ClearListener = Box<dyn Fn() + Send + Sync>;

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            backend: Some(backend),
            lock: RwLock::new(()),
            cookie: CookieConfig::default(),
            clear_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Store backed by files in `dir`
    pub fn file(dir: PathBuf) -> Self {
        Self::new(Arc::new(FileBackend::new(dir)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// A store with no storage at all. Every read is empty and writes are dropped.
    pub fn detached() -> Self {
        Self {
            backend: None,
            lock: RwLock::new(()),
            cookie: CookieConfig::default(),
            clear_listeners: Mutex::new(Vec::new()),
        }
    }

    fn read_record(&self) -> Result<Option<SessionData>> {
        let Some(ref backend) = self.backend else {
            return Ok(None);
        };
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        Self::load(backend.as_ref())
    }

    /// Caller must hold `lock`
    fn load(backend: &dyn SessionBackend) -> Result<Option<SessionData>> {
        let Some(contents) = backend
            .read(Slot::Session)
            .context("Failed to read session record")?
        else {
            return Ok(None);
        };
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session record")?;
        Ok(Some(data))
    }

    /// Read the record, degrading any failure to `None`
    fn record(&self) -> Option<SessionData> {
        match self.read_record() {
            Ok(data) => data.filter(SessionData::is_complete),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session record");
                None
            }
        }
    }

    pub fn inspect(&self) -> SessionHealth {
        match self.read_record() {
            Ok(None) => SessionHealth::Absent,
            Ok(Some(data)) if data.is_complete() => SessionHealth::Active(data.user),
            Ok(Some(_)) => SessionHealth::Corrupted,
            Err(e) => {
                warn!(error = %e, "Session record is corrupted");
                SessionHealth::Corrupted
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.record().is_some()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.record().map(|d| d.user)
    }

    pub fn access_token(&self) -> Option<String> {
        self.record().map(|d| d.access_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.record()
            .map(|d| d.refresh_token)
            .filter(|t| !t.is_empty())
    }

    /// Persist a fresh login: tokens, user and the cookie mirror
    pub fn save(&self, auth: &AuthResponse) {
        let data = SessionData {
            access_token: auth.access_token.clone(),
            refresh_token: auth.refresh_token.clone(),
            user: auth.user.clone(),
            created_at: Utc::now(),
            renewed_at: None,
        };
        if let Err(e) = self.write_record(&data) {
            warn!(error = %e, "Failed to persist session");
        } else {
            debug!(user_id = data.user.id, "Session saved");
        }
    }

    /// Swap in a renewed access token, keeping refresh token and user.
    /// Returns false when there is no session to update.
    pub fn replace_access_token(&self, token: &str) -> bool {
        let Some(ref backend) = self.backend else {
            return false;
        };
        // Read and write under one guard so a concurrent clear() either
        // happens before (nothing to renew) or after (renewal discarded)
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());

        let mut data = match Self::load(backend.as_ref()) {
            Ok(Some(data)) if data.is_complete() => data,
            Ok(_) => return false,
            Err(e) => {
                warn!(error = %e, "Cannot renew an unreadable session record");
                return false;
            }
        };
        data.access_token = token.to_string();
        data.renewed_at = Some(Utc::now());

        match self.persist(backend.as_ref(), &data) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist renewed access token");
                false
            }
        }
    }

    fn write_record(&self, data: &SessionData) -> Result<()> {
        let Some(ref backend) = self.backend else {
            return Ok(());
        };
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        self.persist(backend.as_ref(), data)
    }

    /// Write the record and its cookie mirror. Caller must hold `lock` for writing.
    fn persist(&self, backend: &dyn SessionBackend, data: &SessionData) -> Result<()> {
        let contents = serde_json::to_string_pretty(data)?;
        let cookie = self.cookie.build_set_cookie(&data.access_token, Utc::now());

        backend
            .write(Slot::Session, &contents)
            .context("Failed to write session record")?;
        backend
            .write(Slot::Cookies, &cookie)
            .context("Failed to write cookie mirror")?;
        Ok(())
    }

    /// Remove the record and expire the cookie mirror. Safe to call repeatedly.
    pub fn clear(&self) {
        let Some(ref backend) = self.backend else {
            return;
        };
        {
            let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = backend.remove(Slot::Session) {
                warn!(error = %e, "Failed to remove session record");
            }
            if let Err(e) = backend.write(Slot::Cookies, &self.cookie.build_delete_cookie()) {
                warn!(error = %e, "Failed to expire cookie mirror");
            }
        }
        debug!("Session cleared");

        let listeners = self.clear_listeners.lock().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener();
        }
    }

    /// Run `listener` after every `clear()`, whoever triggered it
    pub fn on_clear(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.clear_listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(listener));
    }

    /// The `Cookie:` header a navigation would carry right now
    pub fn cookie_header(&self) -> Option<String> {
        let backend = self.backend.as_ref()?;
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());

        let line = match backend.read(Slot::Cookies) {
            Ok(line) => line?,
            Err(e) => {
                warn!(error = %e, "Failed to read cookie mirror");
                return None;
            }
        };
        let cookie = StoredCookie::parse(&line)?;
        if cookie.name != self.cookie.name || !cookie.is_live(Utc::now()) {
            return None;
        }
        Some(format!("{}={}", cookie.name, cookie.value))
    }
}
