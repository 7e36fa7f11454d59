//! JSON file persistence for alert configuration and recipients.

use stablewatch_core::State;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load/save wrapper around one JSON state file.
///
/// Loading never fails: a missing or corrupt file yields the default
/// empty state. Saving goes through a sibling temp file and a rename so
/// a crash mid-write cannot leave a half-written state behind.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted state, falling back to default on any problem.
    pub fn load(&self) -> State {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return State::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable state file, starting empty");
                return State::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt state file, starting empty");
                State::default()
            }
        }
    }

    /// Persist the state synchronously.
    pub fn save(&self, state: &State) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = PathBuf::from({
            let mut os: OsString = self.path.clone().into_os_string();
            os.push(".tmp");
            os
        });
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
