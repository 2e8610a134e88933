//! Session state: who is logged in and as what.
//!
//! DESIGN
//! ======
//! `model` holds the plain data (`Session`, `Role`, `WalletSecret`),
//! `storage` persists snapshots under a single namespace, and `store` is the
//! shared handle that replaces or clears the snapshot atomically and writes
//! through to storage on every mutation.

pub mod model;
pub mod storage;
pub mod store;

pub use model::{Role, Session, WalletSecret};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::SessionStore;
