use super::{SessionStore, StoreResult, check_version};
use crate::error::StoreError;
use crate::session::{SessionId, WizardSession};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Stores each session as one JSON document, `<dir>/<id>.json`.
///
/// Writes go through a temporary file and a rename, so a reader never sees a
/// half-written document. The version check and the write happen under one lock,
/// which serializes writers within a process.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Io(format!("Could not create '{}': {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of every stored session, sorted.
    pub fn ids(&self) -> StoreResult<Vec<SessionId>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StoreError::Io(format!("Could not list '{}': {}", self.dir.display(), e))
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(&self, id: SessionId) -> StoreResult<WizardSession> {
        let path = self.path_for(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Could not read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&json).map_err(|e| {
            StoreError::Serialization(format!("'{}' is not a valid session: {}", path.display(), e))
        })
    }

    fn write(&self, session: &WizardSession) -> StoreResult<()> {
        let path = self.path_for(session.id());
        let tmp = self.dir.join(format!(".{}.json.tmp", session.id()));
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut file = fs::File::create(&tmp).map_err(|e| {
            StoreError::Io(format!("Could not create '{}': {}", tmp.display(), e))
        })?;
        file.write_all(&json)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::Io(format!("Could not write '{}': {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            StoreError::Io(format!("Could not replace '{}': {}", path.display(), e))
        })
    }
}

impl SessionStore for FileSessionStore {
    fn insert(&self, session: &WizardSession) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        if self.path_for(session.id()).exists() {
            return Err(StoreError::AlreadyExists(session.id()));
        }
        self.write(session)
    }

    fn load(&self, id: SessionId) -> StoreResult<WizardSession> {
        self.read(id)
    }

    fn save(&self, session: &WizardSession, expected_version: u64) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let stored = self.read(session.id())?;
        check_version(session.id(), expected_version, stored.version())?;
        self.write(session)
    }
}
