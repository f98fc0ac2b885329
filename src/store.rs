//! Local client state
//!
//! Persists the bearer token and the vote-guard list to a small JSON file,
//! the native counterpart of browser local storage. Every mutation is
//! written through immediately; there is no background flush.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors from reading or writing the state file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Corrupt state file {path:?}: {error}")]
    Corrupt {
        path: PathBuf,
        error: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State lock poisoned")]
    Lock,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// On-disk layout of the state file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,

    #[serde(default)]
    voted_polls: BTreeSet<String>,
}

/// Shared handle to the local state. Clones share the same state.
#[derive(Debug, Clone)]
pub struct LocalStore {
    state: Arc<RwLock<LocalState>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Open a file-backed store, starting empty when the file does not exist
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => LocalState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|error| StoreError::Corrupt {
                path: path.clone(),
                error,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalState::default(),
            Err(error) => return Err(StoreError::Io { path, error }),
        };

        tracing::debug!(
            path = ?path,
            logged_in = state.token.is_some(),
            voted = state.voted_polls.len(),
            "Opened local state"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            path: Some(path),
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(LocalState::default())),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> StoreResult<Option<String>> {
        self.read(|s| s.token.clone())
    }

    pub fn set_token(&self, token: &str) -> StoreResult<()> {
        self.mutate(|s| s.token = Some(token.to_string()))
    }

    /// Remove the token. Returns whether one was present.
    pub fn clear_token(&self) -> StoreResult<bool> {
        let mut had = false;
        self.mutate(|s| had = s.token.take().is_some())?;
        Ok(had)
    }

    pub fn has_voted(&self, poll_id: &str) -> StoreResult<bool> {
        self.read(|s| s.voted_polls.contains(poll_id))
    }

    /// Record a vote. Returns false if the poll was already recorded.
    pub fn record_vote(&self, poll_id: &str) -> StoreResult<bool> {
        let mut inserted = false;
        self.mutate(|s| inserted = s.voted_polls.insert(poll_id.to_string()))?;
        Ok(inserted)
    }

    pub fn voted_polls(&self) -> StoreResult<Vec<String>> {
        self.read(|s| s.voted_polls.iter().cloned().collect())
    }

    fn read<T>(&self, f: impl FnOnce(&LocalState) -> T) -> StoreResult<T> {
        let state = self.state.read().map_err(|_| StoreError::Lock)?;
        Ok(f(&*state))
    }

    fn mutate(&self, f: impl FnOnce(&mut LocalState)) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::Lock)?;
        let before = state.clone();
        f(&mut *state);
        if *state == before {
            return Ok(());
        }
        self.persist(&*state)
    }

    fn persist(&self, state: &LocalState) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| StoreError::Io {
                path: parent.to_path_buf(),
                error,
            })?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        std::fs::write(path, bytes).map_err(|error| StoreError::Io {
            path: path.clone(),
            error,
        })
    }
}
