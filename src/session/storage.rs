//! Durable storage for session snapshots.
//!
//! DESIGN
//! ======
//! The on-disk document is a JSON object keyed by namespace, so several
//! portal profiles can share one file while each store only ever touches its
//! own key. Writes go to a sibling temp file and are renamed into place, so a
//! crash mid-write leaves the previous document intact.
//!
//! The wallet secret is written as-is; nothing here encrypts at rest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::model::Session;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session storage document is corrupt: {0}")]
    Corrupt(String),
}

/// Where a [`crate::session::SessionStore`] persists its snapshot.
pub trait SessionStorage: Send + Sync {
    /// Read the persisted snapshot, `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backing medium cannot be read or parsed.
    fn load(&self) -> Result<Option<Session>, StorageError>;

    /// Persist `session`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the write fails.
    fn save(&self, session: &Session) -> Result<(), StorageError>;

    /// Remove the persisted snapshot. Removing nothing is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the write fails.
    fn clear(&self) -> Result<(), StorageError>;
}

// =============================================================================
// FILE STORAGE
// =============================================================================

type Document = BTreeMap<String, serde_json::Value>;

/// JSON file holding one snapshot per namespace.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    namespace: String,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self { path: path.into(), namespace: namespace.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn read_document(&self) -> Result<Document, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_document(&self, doc: &Document) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// A corrupt document is replaced rather than blocking every write.
    fn read_document_for_update(&self) -> Result<Document, StorageError> {
        match self.read_document() {
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "discarding corrupt session document");
                Ok(Document::new())
            }
            other => other,
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        let doc = self.read_document()?;
        match doc.get(&self.namespace) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StorageError::Corrupt(e.to_string())),
        }
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        let mut doc = self.read_document_for_update()?;
        doc.insert(self.namespace.clone(), serde_json::to_value(session)?);
        self.write_document(&doc)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut doc = self.read_document_for_update()?;
        if doc.remove(&self.namespace).is_none() {
            return Ok(());
        }
        self.write_document(&doc)
    }
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// In-process storage for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Session>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `session`, as if persisted by an earlier run.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { slot: Mutex::new(Some(session)) }
    }

    /// Current persisted value.
    #[must_use]
    pub fn persisted(&self) -> Option<Session> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.persisted())
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
