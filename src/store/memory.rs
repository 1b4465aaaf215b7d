use super::{SessionStore, StoreResult, check_version};
use crate::error::StoreError;
use crate::session::{SessionId, WizardSession};
use ahash::AHashMap;
use parking_lot::RwLock;

/// Keeps sessions in process memory. Used in tests and for throwaway servers.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<AHashMap<SessionId, WizardSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: &WizardSession) -> StoreResult<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id()) {
            return Err(StoreError::AlreadyExists(session.id()));
        }
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    fn load(&self, id: SessionId) -> StoreResult<WizardSession> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()> {
        let mut sessions = self.sessions.write();
        let stored = sessions
            .get_mut(&session.id())
            .ok_or(StoreError::NotFound(session.id()))?;
        check_version(session.id(), expected_version, stored.version())?;
        *stored = session.clone();
        Ok(())
    }
}
