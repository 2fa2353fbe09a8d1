//! CLI command implementations.

pub mod available;
pub mod generate;
pub mod occupancy;
pub mod rooms;
pub mod slots;
