//! State file and directory loading.
//!
//! A [`Shelter`] holds an exclusive lock on `<state>.lock` from `open`
//! until it is dropped, so read-modify-write cycles from concurrent CLI
//! sessions never interleave.

use bedline_core::{AllocationEngine, Caller, InMemoryDirectory, Occupant};
use bedline_store::{InMemoryStore, StoreConfig, StoreSnapshot};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default wait for another session to release the state file.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Engine type used by every command.
pub type Engine = AllocationEngine<InMemoryStore, InMemoryDirectory>;

/// An engine loaded from disk, plus where to save it.
pub struct Shelter {
    state_path: PathBuf,
    engine: Engine,
    caller: Caller,
    _lock_file: File,
}

impl Shelter {
    /// Locks and loads the state file (empty if missing) and loads the
    /// beneficiary directory, waiting up to [`DEFAULT_LOCK_TIMEOUT`].
    pub fn open(
        state: &Path,
        directory: Option<&Path>,
        actor: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::open_with_timeout(state, directory, actor, DEFAULT_LOCK_TIMEOUT)
    }

    /// Like [`Shelter::open`], waiting at most `lock_timeout` for the lock.
    pub fn open_with_timeout(
        state: &Path,
        directory: Option<&Path>,
        actor: Option<&str>,
        lock_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let lock_file = lock_state(state, lock_timeout)?;

        let store = match StoreSnapshot::load(state)? {
            Some(snapshot) => {
                debug!(path = %state.display(), rooms = snapshot.rooms.len(), "state loaded");
                InMemoryStore::from_snapshot(snapshot, StoreConfig::default())?
            }
            None => {
                debug!(path = %state.display(), "no state file; starting empty");
                InMemoryStore::new()
            }
        };

        let directory = match directory {
            Some(path) => load_directory(path)?,
            None => InMemoryDirectory::new(),
        };

        Ok(Self {
            state_path: state.to_path_buf(),
            engine: AllocationEngine::new(Arc::new(store), Arc::new(directory)),
            caller: actor.map_or_else(Caller::system, Caller::staff),
            _lock_file: lock_file,
        })
    }

    /// The engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Identity recorded on assignment records.
    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Writes the current state back to the state file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.engine.store().snapshot().save(&self.state_path)?;
        debug!(path = %self.state_path.display(), "state saved");
        Ok(())
    }
}

/// Path of the lock file guarding `state`.
fn lock_path(state: &Path) -> PathBuf {
    let mut name = OsString::from(state.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn lock_state(state: &Path, timeout: Duration) -> Result<File, Box<dyn std::error::Error>> {
    if let Some(parent) = state.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let path = lock_path(state);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;

    let deadline = Instant::now() + timeout;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "state locked");
                return Ok(file);
            }
            Err(_) if Instant::now() < deadline => thread::sleep(LOCK_POLL_INTERVAL),
            Err(e) => {
                return Err(format!(
                    "state file {} is in use by another session: {e}",
                    state.display()
                )
                .into())
            }
        }
    }
}

fn load_directory(path: &Path) -> Result<InMemoryDirectory, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)
        .map_err(|e| format!("cannot read directory {}: {e}", path.display()))?;
    let occupants: Vec<Occupant> = serde_json::from_slice(&bytes)
        .map_err(|e| format!("invalid directory {}: {e}", path.display()))?;
    debug!(path = %path.display(), count = occupants.len(), "directory loaded");
    Ok(InMemoryDirectory::from_occupants(occupants))
}
