//! Test fixtures and shelter helpers.
//!
//! Provides a ready-to-use engine over in-memory collaborators, and a
//! temporary state file for persistence tests.

use bedline_core::{AllocationEngine, EngineConfig, InMemoryDirectory, Occupant};
use bedline_model::{OccupantId, Room, RoomSpec, Sex, Slot};
use bedline_store::{InMemoryStore, OccupancyStore, RoomFilter, StoreConfig, StoreSnapshot};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// The engine type every fixture builds.
pub type TestEngine = AllocationEngine<InMemoryStore, InMemoryDirectory>;

/// An allocation engine over an in-memory store and directory.
///
/// Derefs to the engine, so engine operations can be called directly.
pub struct TestShelter {
    engine: TestEngine,
    next_occupant: AtomicU64,
}

impl Default for TestShelter {
    fn default() -> Self {
        Self::new()
    }
}

impl TestShelter {
    /// Creates an empty shelter with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default(), EngineConfig::default())
    }

    /// Creates an empty shelter.
    pub fn with_config(store: StoreConfig, engine: EngineConfig) -> Self {
        Self::from_store(InMemoryStore::with_config(store), engine)
    }

    /// Wraps an existing store with an empty directory.
    pub fn from_store(store: InMemoryStore, config: EngineConfig) -> Self {
        Self {
            engine: AllocationEngine::with_config(
                Arc::new(store),
                Arc::new(InMemoryDirectory::new()),
                config,
            ),
            next_occupant: AtomicU64::new(1),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &TestEngine {
        &self.engine
    }

    /// Creates a room and generates `bunks` bunks for it.
    pub fn add_room(&self, code: &str, sex: Sex, bunks: u32) -> Room {
        let room = self
            .engine
            .create_room(RoomSpec::new(code, sex, None))
            .expect("Failed to create room");
        if bunks > 0 {
            self.engine
                .generate_capacity(room.id, bunks)
                .expect("Failed to generate capacity");
        }
        self.engine
            .store()
            .room(room.id)
            .expect("Room vanished")
    }

    /// Adds `count` active occupants of `sex` and returns their IDs.
    pub fn add_occupants(&self, sex: Sex, count: usize) -> Vec<OccupantId> {
        (0..count)
            .map(|_| {
                let id = OccupantId::new(self.next_occupant.fetch_add(1, Ordering::Relaxed));
                let occupant = Occupant::new(id, sex)
                    .with_name(format!("Person{}", id.as_u64()), "Test")
                    .with_document(format!("DOC-{}", id.as_u64()));
                self.engine.directory().upsert(occupant);
                id
            })
            .collect()
    }

    /// Adds one occupant as given.
    pub fn add_occupant(&self, occupant: Occupant) -> OccupantId {
        let id = occupant.id;
        self.engine.directory().upsert(occupant);
        id
    }

    /// Finds a slot by code across all rooms.
    ///
    /// # Panics
    ///
    /// Panics if no slot has this code.
    pub fn slot(&self, code: &str) -> Slot {
        self.all_slots()
            .into_iter()
            .find(|s| s.code == code)
            .unwrap_or_else(|| panic!("No slot with code {code}"))
    }

    /// Every slot of every room, active or not.
    pub fn all_slots(&self) -> Vec<Slot> {
        let store = self.engine.store();
        let everything = RoomFilter {
            sex: None,
            include_inactive: true,
        };
        store
            .rooms(&everything)
            .expect("Failed to list rooms")
            .iter()
            .flat_map(|room| store.slots_for_room(room.id).expect("Failed to list slots"))
            .collect()
    }

    /// Exports the store.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.engine.store().snapshot()
    }
}

impl Deref for TestShelter {
    type Target = TestEngine;

    fn deref(&self) -> &TestEngine {
        &self.engine
    }
}

/// A state file inside a temporary directory, removed on drop.
pub struct TempState {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TempState {
    /// Creates a path for a state file that does not exist yet.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            path: temp_dir.path().join("state.json"),
            _temp_dir: temp_dir,
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TempState {
    fn default() -> Self {
        Self::new()
    }
}
