//! Store configuration.

use std::time::Duration;

/// Configuration for an occupancy store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum time to wait for a slot lock before failing with
    /// `LockTimeout`.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lock wait timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}
