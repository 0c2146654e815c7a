//! Backend selection and session bootstrap.

use std::path::PathBuf;

use flutterlog_core::error::Result;
use flutterlog_core::history::{SessionHistory, demo_records};
use flutterlog_core::kv::KeyValueStore;
use flutterlog_core::session::UserSession;
use tracing::info;

use crate::config::AppConfig;
use crate::kv::{FileKeyValueStore, MemoryKeyValueStore};

/// Which key-value backend a session should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// One JSON file per key under the given directory
    File(PathBuf),
    /// Process-local map; nothing is kept after exit
    Memory,
}

impl BackendKind {
    /// File backend at the configured (or platform default) store directory,
    /// or the memory backend when `ephemeral` is set.
    pub fn from_config(config: &AppConfig, ephemeral: bool) -> Result<Self> {
        if ephemeral {
            return Ok(Self::Memory);
        }
        Ok(Self::File(config.resolved_storage_dir()?))
    }
}

pub fn open_backend(kind: &BackendKind) -> Box<dyn KeyValueStore> {
    match kind {
        BackendKind::File(dir) => {
            info!("[Backend] Using file store at {}", dir.display());
            Box::new(FileKeyValueStore::new(dir.clone()))
        }
        BackendKind::Memory => {
            info!("[Backend] Using in-memory store");
            Box::new(MemoryKeyValueStore::new())
        }
    }
}

/// Opens the history for `session`, seeding demo records into an empty
/// history when the configuration asks for it.
pub fn open_session_history<S: KeyValueStore>(
    backend: S,
    session: &UserSession,
    config: &AppConfig,
) -> Result<SessionHistory<S>> {
    let mut history = SessionHistory::new(backend, session);
    if config.seed_demo_data && history.seed_if_empty(demo_records())? {
        info!("[Backend] Seeded demo records for new history");
    }
    Ok(history)
}
