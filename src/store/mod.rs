//! Persistence contract for wizard sessions.
//!
//! Stores are optimistic: every session carries a version, and `save` only succeeds
//! when the stored copy still has the version the caller loaded.

use crate::config::{StoreConfig, WizardConfig};
use crate::error::StoreError;
use crate::session::{SessionId, WizardSession};
use std::sync::Arc;

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for sessions, shared across request threads.
pub trait SessionStore: Send + Sync {
    /// Stores a new session. Fails with `AlreadyExists` if the id is taken.
    fn insert(&self, session: &WizardSession) -> StoreResult<()>;

    /// Loads a session, failing with `NotFound` if absent.
    fn load(&self, id: SessionId) -> StoreResult<WizardSession>;

    /// Replaces the stored session with `session` as a whole.
    ///
    /// Fails with `Conflict` unless the stored copy is at `expected_version`, in
    /// which case nothing is written.
    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()>;
}

impl<T: SessionStore + ?Sized> SessionStore for &T {
    fn insert(&self, session: &WizardSession) -> StoreResult<()> {
        (**self).insert(session)
    }

    fn load(&self, id: SessionId) -> StoreResult<WizardSession> {
        (**self).load(id)
    }

    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()> {
        (**self).save(session, expected_version)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn insert(&self, session: &WizardSession) -> StoreResult<()> {
        (**self).insert(session)
    }

    fn load(&self, id: SessionId) -> StoreResult<WizardSession> {
        (**self).load(id)
    }

    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()> {
        (**self).save(session, expected_version)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn insert(&self, session: &WizardSession) -> StoreResult<()> {
        (**self).insert(session)
    }

    fn load(&self, id: SessionId) -> StoreResult<WizardSession> {
        (**self).load(id)
    }

    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()> {
        (**self).save(session, expected_version)
    }
}

/// Opens the store selected by the configuration.
pub fn open_store(config: &WizardConfig) -> StoreResult<Box<dyn SessionStore>> {
    match &config.store {
        StoreConfig::Memory => Ok(Box::new(MemorySessionStore::new())),
        StoreConfig::File { dir } => Ok(Box::new(FileSessionStore::open(dir)?)),
    }
}

pub(crate) fn check_version(
    id: SessionId,
    expected: u64,
    found: u64,
) -> StoreResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(StoreError::Conflict {
            id,
            expected,
            found,
        })
    }
}
