//! Session records: saved once, loaded by id, listed by directory.

use std::{fs, io};

use crate::model::{Session, SessionId};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Writes the session record. A session is saved exactly once.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let id = session.session_id();
        let path = self.record_path(id);
        if path.exists() {
            return Err(StorageError::SessionAlreadySaved(id.clone()));
        }
        self.prepare_session_dir(id)?;
        let json = serde_json::to_string_pretty(session)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_session(&self, id: &SessionId) -> Result<Session> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Err(StorageError::SessionNotFound(id.clone()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Ids of every saved session, sorted. A missing root lists nothing.
    pub fn list_sessions(&self) -> Result<Vec<SessionId>> {
        let mut ids = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.path().join("session.json").is_file() {
                continue;
            }
            // Directories that aren't valid ids can't have been written by us.
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
