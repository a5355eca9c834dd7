//! Session persistence backends.
//!
//! Without persistence the session resets on every full reload. The file
//! backend plays the role browser local storage plays for the web build.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use clinicshop_core::SessionState;

/// Errors reading or writing persisted session state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Storage for the session across reloads.
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// Load the stored session, if any.
    async fn load(&self) -> Result<Option<SessionState>, PersistenceError>;

    /// Store `state`, replacing whatever was there.
    async fn save(&self, state: &SessionState) -> Result<(), PersistenceError>;

    /// Remove the stored session. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), PersistenceError>;
}

/// Session kept in process memory only.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<SessionState>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SessionState>> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionPersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<SessionState>, PersistenceError> {
        Ok(self.slot().clone())
    }

    async fn save(&self, state: &SessionState) -> Result<(), PersistenceError> {
        *self.slot() = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Session stored as JSON in a file.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionPersistence for FilePersistence {
    async fn load(&self) -> Result<Option<SessionState>, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &SessionState) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
