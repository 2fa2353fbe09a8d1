//! Snapshot export and file persistence.

use crate::error::StoreResult;
use bedline_model::{AssignmentRecord, Room, Slot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Point-in-time copy of every table in a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Format version.
    pub version: u32,
    /// All rooms, active or not.
    pub rooms: Vec<Room>,
    /// All slots.
    pub slots: Vec<Slot>,
    /// All assignment records, oldest first.
    pub assignments: Vec<AssignmentRecord>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            rooms: Vec::new(),
            slots: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

impl StoreSnapshot {
    /// Reads a snapshot from a JSON file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> StoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Writes the snapshot as JSON.
    ///
    /// The data is written to a sibling temporary file, synced, and renamed
    /// over `path`, so readers never observe a partial file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut file, self)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
