//! Local persistence for sessions.
//!
//! Each session lives in its own directory under the storage root:
//!
//! ```text
//! <root>/<session-id>/
//!   session.json     # The full session record, written once at the end of a run
//!   nmap.xml         # Raw discovery scan output
//!   logs/
//!     cmd_01.log     # One captured log per executed command
//! ```

mod session;

use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::model::SessionId;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session already saved: {0}")]
    SessionAlreadySaved(SessionId),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage for sessions and their artifacts.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Opens storage without touching the filesystem. For read-only use.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn logs_dir(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join("logs")
    }

    /// Where the discovery scan writes its XML.
    pub fn discovery_xml_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join("nmap.xml")
    }

    /// Creates the session's directory, ahead of any artifacts.
    pub fn prepare_session_dir(&self, id: &SessionId) -> Result<PathBuf> {
        let dir = self.session_dir(id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn record_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join("session.json")
    }
}
