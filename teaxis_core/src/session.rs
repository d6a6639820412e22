//! Persisted authentication session.
//!
//! The [`SessionStore`] is the single source of truth for who is signed in.
//! It is an explicit, cloneable handle: construct it once and hand it to the
//! API client and to every screen. Every mutation is written through to a
//! [`SnapshotStorage`]; storage failures are logged and swallowed, so the
//! in-memory state stays authoritative for the life of the process.

use crate::validation::ValidationError;
use crate::{Error, ProfilePatch, Result, User, UserRole};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tempfile::NamedTempFile;

/// The persisted blob: `{user, token, isAuthenticated}`
///
/// `is_authenticated` is true exactly when both `user` and `token` are set.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "isAuthenticated", default)]
    pub is_authenticated: bool,
}

impl SessionState {
    fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }

    /// Bring a restored snapshot back in line with the invariant
    fn normalized(self) -> Self {
        match (self.user, self.token) {
            (Some(user), Some(token)) if !token.is_empty() => Self::authenticated(user, token),
            _ => Self::default(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// The two observable states of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticated,
}

/// Durable storage for session snapshots
pub trait SnapshotStorage: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<SessionState>>;
    fn save(&self, state: &SessionState) -> Result<()>;
}

/// JSON file storage with file locking and atomic replacement
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;
        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read?;

        let state = serde_json::from_str::<SessionState>(&contents)?;
        Ok(Some(state))
    }

    /// Atomically writes the snapshot by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&self, state: &SessionState) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Other(format!("session path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(state)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Saved session snapshot to {:?}", self.path);
        Ok(())
    }
}

/// In-memory storage holding the serialized blob; useful for tests and
/// for running without a data directory
#[derive(Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with a raw blob, as if a previous process wrote it
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        match self.blob() {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let blob = serde_json::to_string(state)?;
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob);
        Ok(())
    }
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for Arc<S> {
    fn load(&self) -> Result<Option<SessionState>> {
        (**self).load()
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        (**self).save(state)
    }
}

struct Inner {
    state: RwLock<SessionState>,
    storage: Box<dyn SnapshotStorage>,
}

/// Shared handle to the process-wide session
///
/// Clones share the same state. It is mutated only through [`login`],
/// [`logout`] and [`update_profile`].
///
/// [`login`]: SessionStore::login
/// [`logout`]: SessionStore::logout
/// [`update_profile`]: SessionStore::update_profile
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Start from the last persisted snapshot, or anonymous if there is none
    /// or it cannot be read. Never fails.
    pub fn restore(storage: impl SnapshotStorage + 'static) -> Self {
        let state = match storage.load() {
            Ok(Some(state)) => {
                let state = state.normalized();
                tracing::debug!("Restored session (phase: {:?})", state.phase());
                state
            }
            Ok(None) => {
                tracing::debug!("No stored session found, starting signed out");
                SessionState::default()
            }
            Err(e) => {
                tracing::warn!("Unable to restore session: {}. Starting signed out.", e);
                SessionState::default()
            }
        };

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                storage: Box::new(storage),
            }),
        }
    }

    /// Restore from a JSON file on disk
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::restore(FileStorage::new(path))
    }

    /// A fresh anonymous store backed by memory only
    pub fn in_memory() -> Self {
        Self::restore(MemoryStorage::new())
    }

    /// Atomically mark `user` as signed in with `token`
    pub fn login(&self, user: User, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(ValidationError::EmptyToken.into());
        }
        tracing::debug!("Signed in as user {}", user.id);
        self.mutate(|state| *state = SessionState::authenticated(user, token));
        Ok(())
    }

    /// Clear the session. Calling it while signed out changes nothing.
    pub fn logout(&self) {
        self.mutate(|state| {
            if *state != SessionState::default() {
                tracing::debug!("Signed out");
            }
            *state = SessionState::default();
        });
    }

    /// Shallow-merge `patch` into the current user; silently ignored when
    /// signed out
    pub fn update_profile(&self, patch: ProfilePatch) {
        self.mutate(|state| match state.user.as_mut() {
            Some(user) => user.merge(patch),
            None => tracing::debug!("Ignoring profile update while signed out"),
        });
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.read().user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` and write the result through while still holding the lock,
    /// so the persisted order matches the in-memory order
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut *state);
        if let Err(e) = self.inner.storage.save(&*state) {
            tracing::warn!("Failed to persist session: {}. Keeping in-memory state.", e);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("user", &state.user.as_ref().map(|u| u.id))
            .field("token", &state.token.as_ref().map(|_| "<redacted>"))
            .field("is_authenticated", &state.is_authenticated)
            .finish()
    }
}
