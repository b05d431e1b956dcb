//! Accounting state and its mutations
//!
//! [`BankerState`] owns the allocation and claim tables plus the
//! available vector, and is the only place state transitions happen.
//! Construction validates every invariant once; `request` and `release`
//! preserve them. The struct is lock-free on its own — concurrency is
//! layered on top by the manager.

use crate::safety;
use resguard_errors::AvoidanceError;
use resguard_types::{DeniedReason, Matrix, RequestOutcome, StateSnapshot, Units};

/// Full resource-accounting state: who holds what, who may claim what,
/// and what remains free.
///
/// Invariants, established at construction and preserved by every
/// mutation:
/// - all entries are non-negative;
/// - `allocation[p][r] <= max_claim[p][r]` for all p, r;
/// - `available[r] + sum of allocation column r == total_units[r]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankerState {
    allocation: Matrix,
    max_claim: Matrix,
    available: Vec<Units>,
    total_units: Vec<Units>,
}

impl BankerState {
    /// Build a validated state. `total_units` is derived as the column
    /// sums of `allocation` plus `available` and is fixed for the
    /// lifetime of the state.
    ///
    /// # Errors
    ///
    /// - `EmptySystem` if there are no processes or no resource types;
    /// - `ShapeMismatch` if the two matrices or the available vector
    ///   disagree on dimensions;
    /// - `NegativeValue` if any entry is negative;
    /// - `ClaimBelowAllocation` if a process already holds more of a
    ///   resource than its claim admits.
    pub fn new(
        allocation: Matrix,
        max_claim: Matrix,
        available: Vec<Units>,
    ) -> Result<Self, AvoidanceError> {
        let processes = allocation.row_count();
        let resources = allocation.col_count();

        if processes == 0 || resources == 0 {
            return Err(AvoidanceError::EmptySystem);
        }
        if max_claim.row_count() != processes {
            return Err(AvoidanceError::ShapeMismatch {
                expected: processes,
                actual: max_claim.row_count(),
            });
        }
        if max_claim.col_count() != resources {
            return Err(AvoidanceError::ShapeMismatch {
                expected: resources,
                actual: max_claim.col_count(),
            });
        }
        if available.len() != resources {
            return Err(AvoidanceError::ShapeMismatch {
                expected: resources,
                actual: available.len(),
            });
        }

        for value in allocation
            .iter_rows()
            .chain(max_claim.iter_rows())
            .flatten()
            .chain(&available)
        {
            if *value < 0 {
                return Err(AvoidanceError::NegativeValue { value: *value });
            }
        }

        for process in 0..processes {
            for resource in 0..resources {
                if allocation.get(process, resource) > max_claim.get(process, resource) {
                    return Err(AvoidanceError::ClaimBelowAllocation { process, resource });
                }
            }
        }

        let mut total_units = allocation.column_sums();
        for (total, avail) in total_units.iter_mut().zip(&available) {
            *total += avail;
        }

        Ok(Self {
            allocation,
            max_claim,
            available,
            total_units,
        })
    }

    /// Number of registered processes.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.allocation.row_count()
    }

    /// Number of resource types.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.allocation.col_count()
    }

    /// Units currently held, one row per process.
    #[must_use]
    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    /// Declared maximum simultaneous holdings, one row per process.
    #[must_use]
    pub fn max_claim(&self) -> &Matrix {
        &self.max_claim
    }

    /// Units of each resource currently unallocated.
    #[must_use]
    pub fn available(&self) -> &[Units] {
        &self.available
    }

    /// Fixed per-resource capacity of the system.
    #[must_use]
    pub fn total_units(&self) -> &[Units] {
        &self.total_units
    }

    /// Remaining claim (`max_claim - allocation`) for one process.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if the index is out of range.
    pub fn need(&self, process: usize) -> Result<Vec<Units>, AvoidanceError> {
        self.check_process(process)?;
        Ok(self
            .max_claim
            .row(process)
            .iter()
            .zip(self.allocation.row(process))
            .map(|(claim, held)| claim - held)
            .collect())
    }

    /// Attempt to grant `demand` to `process`.
    ///
    /// Contract checks run first (valid index, correct vector shape,
    /// non-negative entries), then the policy checks in their fixed
    /// order: claim bound, availability, safety. Only a demand that
    /// passes all three is committed; a denied request leaves the state
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess`, `ShapeMismatch`, or `NegativeValue` on
    /// contract violations. Policy denials are `Ok(Denied(_))`.
    pub fn request(
        &mut self,
        process: usize,
        demand: &[Units],
    ) -> Result<RequestOutcome, AvoidanceError> {
        self.check_process(process)?;
        self.check_vector(demand)?;

        for (resource, (requested, remaining)) in
            demand.iter().zip(self.need_row(process)).enumerate()
        {
            if *requested > remaining {
                return Ok(RequestOutcome::Denied(DeniedReason::ExceedsClaim {
                    resource,
                    requested: *requested,
                    remaining,
                }));
            }
        }

        for (resource, (requested, available)) in demand.iter().zip(&self.available).enumerate() {
            if requested > available {
                return Ok(RequestOutcome::Denied(DeniedReason::InsufficientAvailable {
                    resource,
                    requested: *requested,
                    available: *available,
                }));
            }
        }

        // Hypothetical commit: mutate copies, keep the live tables
        // untouched until the candidate proves safe.
        let mut candidate_allocation = self.allocation.clone();
        candidate_allocation.add_assign_row(process, demand);
        let mut candidate_available = self.available.clone();
        for (avail, requested) in candidate_available.iter_mut().zip(demand) {
            *avail -= requested;
        }

        if !safety::is_safe(&candidate_allocation, &self.max_claim, &candidate_available) {
            return Ok(RequestOutcome::Denied(DeniedReason::UnsafeState));
        }

        self.allocation = candidate_allocation;
        self.available = candidate_available;
        debug_assert!(self.conserves_totals());
        Ok(RequestOutcome::Granted)
    }

    /// Return `amount` of each resource from `process` to the available
    /// pool. Never needs a safety check: giving units back cannot create
    /// unsafety.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess`, `ShapeMismatch`, or `NegativeValue` on
    /// malformed input, and `ReleaseExceedsHeld` if any component exceeds
    /// what the process currently holds. State is unchanged on error.
    pub fn release(&mut self, process: usize, amount: &[Units]) -> Result<(), AvoidanceError> {
        self.check_process(process)?;
        self.check_vector(amount)?;

        for (resource, (returned, held)) in
            amount.iter().zip(self.allocation.row(process)).enumerate()
        {
            if returned > held {
                return Err(AvoidanceError::ReleaseExceedsHeld {
                    process,
                    resource,
                    held: *held,
                    amount: *returned,
                });
            }
        }

        self.allocation.sub_assign_row(process, amount);
        for (avail, returned) in self.available.iter_mut().zip(amount) {
            *avail += returned;
        }
        debug_assert!(self.conserves_totals());
        Ok(())
    }

    /// Detached copy of all tables for observability.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            allocation: self.allocation.to_rows(),
            max_claim: self.max_claim.to_rows(),
            available: self.available.clone(),
            total_units: self.total_units.clone(),
        }
    }

    /// Whether a safe completion order exists from the current state.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        safety::is_safe(&self.allocation, &self.max_claim, &self.available)
    }

    /// One witness order in which every process could run to completion,
    /// if the current state is safe.
    #[must_use]
    pub fn safe_sequence(&self) -> Option<Vec<usize>> {
        safety::safe_sequence(&self.allocation, &self.max_claim, &self.available)
    }

    fn need_row(&self, process: usize) -> impl Iterator<Item = Units> + '_ {
        self.max_claim
            .row(process)
            .iter()
            .zip(self.allocation.row(process))
            .map(|(claim, held)| claim - held)
    }

    fn check_process(&self, process: usize) -> Result<(), AvoidanceError> {
        if process >= self.process_count() {
            return Err(AvoidanceError::UnknownProcess {
                process,
                process_count: self.process_count(),
            });
        }
        Ok(())
    }

    fn check_vector(&self, values: &[Units]) -> Result<(), AvoidanceError> {
        if values.len() != self.resource_count() {
            return Err(AvoidanceError::ShapeMismatch {
                expected: self.resource_count(),
                actual: values.len(),
            });
        }
        if let Some(value) = values.iter().find(|v| **v < 0) {
            return Err(AvoidanceError::NegativeValue { value: *value });
        }
        Ok(())
    }

    fn conserves_totals(&self) -> bool {
        let mut sums = self.allocation.column_sums();
        for (sum, avail) in sums.iter_mut().zip(&self.available) {
            *sum += avail;
        }
        sums == self.total_units && self.available.iter().all(|avail| *avail >= 0)
    }
}
