//! Persisted monitoring status blob.
//!
//! A small JSON record written on every lifecycle transition so a
//! separately-opened control surface can recover the current on/off state
//! without asking the coordinator.  This is the only durable state the
//! relay owns; losing the file is harmless beyond a stale UI.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::relay::coordinator::ContextId;

/// The persisted key/value record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Whether a monitoring session is currently active.
    pub is_monitoring: bool,
    /// Handle of the active capture context, if any.
    pub context_id: Option<ContextId>,
}

/// Reads and writes the status blob at a fixed path.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the current status; a missing or unreadable file reads as the
    /// default (not monitoring) so callers never special-case first run.
    pub fn load(&self) -> MonitorStatus {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => MonitorStatus::default(),
        }
    }

    /// Write `status`, creating parent directories as needed.
    pub fn write(&self, status: &MonitorStatus) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(status)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), MonitorStatus::default());
    }

    #[test]
    fn round_trip() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.json"));

        let status = MonitorStatus {
            is_monitoring: true,
            context_id: Some(3),
        };
        store.write(&status).expect("write");
        assert_eq!(store.load(), status);
    }

    #[test]
    fn corrupt_file_loads_as_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, "not json {").unwrap();

        let store = StatusStore::new(path);
        assert_eq!(store.load(), MonitorStatus::default());
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("nested/dir/status.json"));
        store.write(&MonitorStatus::default()).expect("write");
        assert_eq!(store.load(), MonitorStatus::default());
    }
}
