//! # Bedline Testkit
//!
//! Test utilities for bedline.
//!
//! This crate provides:
//! - [`TestShelter`], an engine over an in-memory store and directory
//! - Property-based generators for rooms and operation sequences
//! - [`check_invariants`] for occupancy invariants over a store snapshot
//! - Concurrent race and churn harnesses
//!
//! ## Usage
//!
//! ```rust
//! use bedline_model::Sex;
//! use bedline_testkit::prelude::*;
//!
//! let shelter = TestShelter::new();
//! shelter.add_room("H-101", Sex::Male, 2);
//! let men = shelter.add_occupants(Sex::Male, 3);
//!
//! let outcome = race_assign(shelter.engine(), shelter.slot("H-101-L1-C1").id, &men);
//! assert_eq!(outcome.winners.len(), 1);
//! check_invariants(&shelter.snapshot()).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod invariants;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use invariants::*;
pub use stress::*;
