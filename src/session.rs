//! Session Store: the single source of truth for "is the user authenticated".
//!
//! The in-memory session is mirrored into a [`SessionStorage`] backend so it survives restarts.
//! A session is either fully present (token and username) or absent; there is no way to hold
//! one without the other.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::StorageError;

/// Durable key for the bearer token.
pub const TOKEN_KEY: &str = "authToken";
/// Durable key for the display name.
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential, forwarded verbatim in the `Authorization` header.
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new<T: Into<String>, U: Into<String>>(token: T, username: U) -> Self {
        Self { token: token.into(), username: username.into() }
    }
}

/// Durable key/value backing for the session. Both keys are written and removed together.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StorageError>;
    fn save(&self, session: &Session) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Build a session from the two durable entries; a lone key counts as no session.
fn session_from_entries(entries: &BTreeMap<String, String>) -> Option<Session> {
    match (entries.get(TOKEN_KEY), entries.get(USERNAME_KEY)) {
        (Some(t), Some(u)) if !t.is_empty() && !u.is_empty() => Some(Session::new(t.clone(), u.clone())),
        _ => None,
    }
}

fn entries_for(session: &Session) -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert(TOKEN_KEY.to_string(), session.token.clone());
    m.insert(USERNAME_KEY.to_string(), session.username.clone());
    m
}

/// JSON file holding `{"authToken": .., "username": ..}`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        if !self.path.exists() { return Ok(None); }
        let text = std::fs::read_to_string(&self.path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&text)?;
        Ok(session_from_entries(&entries))
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let body = serde_json::to_string_pretty(&entries_for(session))?;
        // write-then-rename so a crash never leaves one key without the other
        let tmp = self.tmp_path();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Pre-seeded storage, as if a previous run had persisted `session`.
    pub fn with_session(session: &Session) -> Self {
        Self { entries: Mutex::new(entries_for(session)) }
    }

    /// Raw view of the durable entries.
    pub fn entries(&self) -> BTreeMap<String, String> { self.entries.lock().clone() }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(session_from_entries(&self.entries.lock()))
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        *self.entries.lock() = entries_for(session);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}

type Observer = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// Shared handle injected into every component that reads or writes the session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    current: RwLock<Option<Session>>,
    storage: Box<dyn SessionStorage>,
    observers: Mutex<Vec<Observer>>,
}

impl SessionStore {
    /// Open the store, restoring whatever the backend persisted. Unreadable or half-written
    /// state is discarded and cleared.
    pub fn open(storage: Box<dyn SessionStorage>) -> Self {
        let restored = match storage.load() {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "signup::session", "discarding unreadable persisted session: {}", e);
                None
            }
        };
        // a lone key or a corrupt file must not outlive this call
        if restored.is_none() {
            if let Err(e) = storage.clear() {
                error!(target: "signup::session", "failed to clear persisted session: {}", e);
            }
        }
        debug!(target: "signup::session", restored = restored.is_some(), "session store opened");
        Self {
            inner: Arc::new(StoreInner {
                current: RwLock::new(restored),
                storage,
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn in_memory() -> Self { Self::open(Box::new(MemoryStorage::new())) }

    pub fn get(&self) -> Option<Session> { self.inner.current.read().clone() }

    pub fn token(&self) -> Option<String> { self.inner.current.read().as_ref().map(|s| s.token.clone()) }

    pub fn is_authenticated(&self) -> bool { self.inner.current.read().is_some() }

    /// Replace the session and persist it; `None` clears the persisted entries.
    /// Observers run after the write, outside the lock.
    pub fn set(&self, session: Option<Session>) {
        {
            let mut cur = self.inner.current.write();
            *cur = session.clone();
        }
        let persisted = match &session {
            Some(s) => self.inner.storage.save(s),
            None => self.inner.storage.clear(),
        };
        if let Err(e) = persisted {
            // memory stays authoritative for this run
            error!(target: "signup::session", "failed to persist session change: {}", e);
        }
        debug!(target: "signup::session", authenticated = session.is_some(), "session changed");
        let observers = self.inner.observers.lock();
        for obs in observers.iter() { obs(session.as_ref()); }
    }

    pub fn clear(&self) { self.set(None) }

    /// Register a callback that runs after every `set`.
    pub fn subscribe<F>(&self, f: F)
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        self.inner.observers.lock().push(Box::new(f));
    }
}
