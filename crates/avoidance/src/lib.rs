#![deny(clippy::pedantic, unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc // in-range indices are established by validation before any table access
)]

//! Deadlock avoidance for the resguard resource manager
//!
//! This crate implements the Banker's Algorithm: it tracks per-process
//! allocations and maximum claims over a fixed set of resource types and
//! refuses any request that could lead the system into a state from
//! which deadlock cannot be ruled out. The safety check is a pure
//! function over a state snapshot; the [`AvoidanceManager`] wraps the
//! state in a single lock so that check-and-commit is atomic under
//! concurrent callers.

pub mod manager;
pub mod safety;
pub mod state;

pub use manager::AvoidanceManager;
pub use safety::{is_safe, safe_sequence};
pub use state::BankerState;
