//! Engine configuration.

use bedline_model::DEFAULT_SLOTS_PER_BUNK;

/// Configuration for an [`AllocationEngine`](crate::AllocationEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Slots generated per bunk by capacity generation.
    pub slots_per_bunk: u8,

    /// How many times auto-assign re-picks a room after losing a race.
    pub auto_assign_retries: u32,

    /// Default result cap for available-occupant searches.
    pub available_occupants_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slots_per_bunk: DEFAULT_SLOTS_PER_BUNK,
            auto_assign_retries: 1,
            available_occupants_limit: 20,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of slots generated per bunk.
    #[must_use]
    pub const fn slots_per_bunk(mut self, slots: u8) -> Self {
        self.slots_per_bunk = slots;
        self
    }

    /// Sets how many times auto-assign retries after a lost race.
    #[must_use]
    pub const fn auto_assign_retries(mut self, retries: u32) -> Self {
        self.auto_assign_retries = retries;
        self
    }

    /// Sets the default available-occupant search limit.
    #[must_use]
    pub const fn available_occupants_limit(mut self, limit: usize) -> Self {
        self.available_occupants_limit = limit;
        self
    }
}
