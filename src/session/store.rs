//! Shared session handle.
//!
//! DESIGN
//! ======
//! The current snapshot lives in a `tokio::sync::watch` sender. Every
//! mutation runs inside `send_if_modified`, which holds the channel lock, so
//! replace/clear and the write-through to storage happen as one step and
//! subscribers never observe a half-applied session.
//!
//! None of the operations fail. A storage write error is logged and the
//! in-memory snapshot still changes; the next successful write catches the
//! durable copy up.

use std::sync::Arc;

use tokio::sync::watch;

use super::model::Session;
use super::storage::SessionStorage;

/// Cloneable handle to the single session of a portal context.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Session>>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Open the store, reading back whatever `storage` persisted.
    ///
    /// An unreadable snapshot starts the store empty.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = match storage.load() {
            Ok(Some(session)) => {
                tracing::debug!(principal = %session.principal_label(), "session restored");
                session
            }
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore session, starting empty");
                Session::default()
            }
        };
        let (state, _rx) = watch::channel(initial);
        Self { state: Arc::new(state), storage }
    }

    /// Read-only copy of the current snapshot.
    #[must_use]
    pub fn get_session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Replace the whole session with `snapshot`.
    pub fn set_session(&self, snapshot: Session) {
        self.set_session_if(snapshot, || true);
    }

    /// Replace the whole session only if `still_valid` holds at commit time.
    ///
    /// `still_valid` runs under the same lock as the replacement, so a check
    /// such as "is this login still the latest" cannot race with another
    /// commit. Returns whether the snapshot was applied.
    pub fn set_session_if(&self, snapshot: Session, still_valid: impl FnOnce() -> bool) -> bool {
        let storage = &self.storage;
        self.state.send_if_modified(move |current| {
            if !still_valid() {
                return false;
            }
            if let Err(e) = storage.save(&snapshot) {
                tracing::warn!(error = %e, "failed to persist session");
            }
            *current = snapshot;
            true
        })
    }

    /// Reset every field to its empty default. Clearing an empty session
    /// does nothing.
    pub fn clear_session(&self) {
        self.clear_session_if(|_| true);
    }

    /// Clear only if `still_valid` accepts the snapshot current at commit
    /// time, e.g. "the token a request was rejected for is still the one in
    /// use". Runs under the same lock as the clear. Returns whether anything
    /// was cleared.
    pub fn clear_session_if(&self, still_valid: impl FnOnce(&Session) -> bool) -> bool {
        let storage = &self.storage;
        let cleared = self.state.send_if_modified(|current| {
            if *current == Session::default() || !still_valid(current) {
                return false;
            }
            if let Err(e) = storage.clear() {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            *current = Session::default();
            true
        });
        if cleared {
            tracing::info!("session cleared");
        }
        cleared
    }

    /// Receiver that observes every applied mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("session", &*self.state.borrow()).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
