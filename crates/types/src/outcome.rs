//! Request outcomes and denial reasons
//!
//! A denial is an expected result of asking for resources, not an error:
//! callers routinely retry after `InsufficientAvailable`, give up on
//! `ExceedsClaim`, and back off on `UnsafeState`. Contract violations
//! (bad indices, malformed vectors) are errors and live in
//! `resguard-errors` instead.

use crate::Units;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeniedReason {
    /// The demand exceeds what the process declared it would ever need.
    /// Retrying the same request can never succeed.
    ExceedsClaim {
        resource: usize,
        requested: Units,
        remaining: Units,
    },

    /// Fewer units are currently available than requested. Retrying after
    /// another process releases may succeed.
    InsufficientAvailable {
        resource: usize,
        requested: Units,
        available: Units,
    },

    /// The units are numerically available, but granting them would put
    /// the system in a state from which deadlock cannot be ruled out.
    UnsafeState,
}

impl fmt::Display for DeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsClaim {
                resource,
                requested,
                remaining,
            } => write!(
                f,
                "demand of {requested} exceeds remaining claim of {remaining} for resource {resource}"
            ),
            Self::InsufficientAvailable {
                resource,
                requested,
                available,
            } => write!(
                f,
                "demand of {requested} exceeds {available} available units of resource {resource}"
            ),
            Self::UnsafeState => write!(f, "granting would leave the system in an unsafe state"),
        }
    }
}

/// Result of a resource request that passed its contract checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    /// The demand was committed; the process now holds the units.
    Granted,
    /// The demand was not committed; state is unchanged.
    Denied(DeniedReason),
}

impl RequestOutcome {
    /// True if the request was committed.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The denial reason, if any.
    #[must_use]
    pub fn denied_reason(&self) -> Option<DeniedReason> {
        match self {
            Self::Granted => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied(reason) => write!(f, "denied: {reason}"),
        }
    }
}
