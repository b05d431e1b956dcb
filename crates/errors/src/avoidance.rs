//! Resource accounting contract-violation error types
//!
//! These cover caller mistakes: malformed input, references to processes
//! outside the registered index space, and releases that exceed what a
//! process holds. Policy denials (a request that cannot be granted right
//! now) are not errors and live in the outcome types instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AvoidanceError {
    #[error("unknown process: {process} (registered: {process_count})")]
    UnknownProcess { process: usize, process_count: usize },

    #[error("shape mismatch: expected {expected} resource entries, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("negative resource count: {value}")]
    NegativeValue { value: i64 },

    #[error("max claim below allocation for process {process}, resource {resource}")]
    ClaimBelowAllocation { process: usize, resource: usize },

    #[error(
        "release exceeds held: process {process} holds {held} of resource {resource}, tried to release {amount}"
    )]
    ReleaseExceedsHeld {
        process: usize,
        resource: usize,
        held: i64,
        amount: i64,
    },

    #[error("empty system: at least one process and one resource type required")]
    EmptySystem,
}
