//! Read-only state snapshots
//!
//! A snapshot is a detached copy of the manager's tables for
//! observability. The caller owns it outright; nothing in it aliases live
//! state.

use crate::Units;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the full accounting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Units currently held, one row per process.
    pub allocation: Vec<Vec<Units>>,
    /// Declared maximum simultaneous holdings, one row per process.
    pub max_claim: Vec<Vec<Units>>,
    /// Units not allocated to any process.
    pub available: Vec<Units>,
    /// Fixed per-resource capacity of the system.
    pub total_units: Vec<Units>,
}

impl StateSnapshot {
    /// Number of processes in the snapshot.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.allocation.len()
    }

    /// Number of resource types in the snapshot.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    /// Remaining claim (`max_claim - allocation`) for one process, or
    /// `None` if the index is out of range.
    #[must_use]
    pub fn need(&self, process: usize) -> Option<Vec<Units>> {
        let held = self.allocation.get(process)?;
        let claim = self.max_claim.get(process)?;
        Some(claim.iter().zip(held).map(|(c, h)| c - h).collect())
    }

    /// Check the conservation invariant: for every resource, available
    /// plus the column sum of allocation equals the fixed total. A
    /// snapshot with mismatched row lengths is reported inconsistent,
    /// not panicked on — the fields are public and caller-owned.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let resources = self.resource_count();
        if self.total_units.len() != resources
            || self.allocation.iter().any(|row| row.len() != resources)
        {
            return false;
        }
        (0..resources).all(|r| {
            let allocated: Units = self.allocation.iter().map(|row| row[r]).sum();
            self.available[r] + allocated == self.total_units[r]
        })
    }
}
