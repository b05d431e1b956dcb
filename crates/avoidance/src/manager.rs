//! Thread-safe manager around the accounting state
//!
//! Callers on different threads share one [`AvoidanceManager`] (it is
//! `Clone`; clones share state). Every operation holds the single state
//! lock for its full duration, including the safety check — two requests
//! that are individually safe can be jointly unsafe, so the whole
//! read-check-commit sequence must be one critical section.

use crate::state::BankerState;
use resguard_errors::{Error, Result};
use resguard_types::{DeniedReason, Matrix, RequestOutcome, StateSnapshot, Units};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Shared handle to a deadlock-avoiding resource manager.
#[derive(Debug, Clone)]
pub struct AvoidanceManager {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<BankerState>,
    // Signalled after every successful release; blocking requesters
    // re-evaluate from scratch on each wake-up.
    released: Condvar,
    processes: usize,
    resources: usize,
}

impl AvoidanceManager {
    /// Create a manager from validated tables.
    ///
    /// # Errors
    ///
    /// Propagates the construction errors of [`BankerState::new`]:
    /// `EmptySystem`, `ShapeMismatch`, `NegativeValue`, or
    /// `ClaimBelowAllocation`.
    pub fn new(allocation: Matrix, max_claim: Matrix, available: Vec<Units>) -> Result<Self> {
        let state = BankerState::new(allocation, max_claim, available)?;
        let processes = state.process_count();
        let resources = state.resource_count();
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                released: Condvar::new(),
                processes,
                resources,
            }),
        })
    }

    /// Create a manager from nested row vectors.
    ///
    /// # Errors
    ///
    /// As [`AvoidanceManager::new`], plus `ShapeMismatch` for ragged
    /// input rows.
    pub fn from_rows(
        allocation: Vec<Vec<Units>>,
        max_claim: Vec<Vec<Units>>,
        available: Vec<Units>,
    ) -> Result<Self> {
        let allocation = Matrix::from_rows(allocation)?;
        let max_claim = Matrix::from_rows(max_claim)?;
        Self::new(allocation, max_claim, available)
    }

    /// Ask for `demand` units on behalf of `process`. Fails fast: a
    /// request that cannot be granted right now is denied, never queued.
    ///
    /// # Errors
    ///
    /// Contract violations (`UnknownProcess`, `ShapeMismatch`,
    /// `NegativeValue`) and a poisoned state lock. Policy denials are
    /// `Ok(Denied(_))`.
    pub fn request(&self, process: usize, demand: &[Units]) -> Result<RequestOutcome> {
        let mut state = self.lock_state()?;
        let outcome = state.request(process, demand)?;
        log_outcome(process, demand, outcome);
        Ok(outcome)
    }

    /// Like [`AvoidanceManager::request`], but parks the caller until the
    /// demand can be granted instead of denying on
    /// `InsufficientAvailable` or `UnsafeState`. Each release wakes all
    /// waiters and every precondition is re-evaluated from scratch, so
    /// spurious wake-ups are harmless. `ExceedsClaim` still returns
    /// immediately — no release can ever satisfy an over-claim.
    ///
    /// # Errors
    ///
    /// As [`AvoidanceManager::request`].
    pub fn request_blocking(&self, process: usize, demand: &[Units]) -> Result<RequestOutcome> {
        let mut state = self.lock_state()?;
        loop {
            let outcome = state.request(process, demand)?;
            match outcome {
                RequestOutcome::Granted
                | RequestOutcome::Denied(DeniedReason::ExceedsClaim { .. }) => {
                    log_outcome(process, demand, outcome);
                    return Ok(outcome);
                }
                RequestOutcome::Denied(reason) => {
                    tracing::trace!("process {process} waiting for release after denial: {reason}");
                    state = self
                        .shared
                        .released
                        .wait(state)
                        .map_err(|_| Error::internal("state lock poisoned"))?;
                }
            }
        }
    }

    /// Return `amount` units from `process` to the pool and wake any
    /// blocked requesters.
    ///
    /// # Errors
    ///
    /// `UnknownProcess`, `ShapeMismatch`, `NegativeValue`, or
    /// `ReleaseExceedsHeld`; state is unchanged on error.
    pub fn release(&self, process: usize, amount: &[Units]) -> Result<()> {
        let mut state = self.lock_state()?;
        state.release(process, amount)?;
        tracing::debug!("process {process} released {amount:?}");
        self.shared.released.notify_all();
        Ok(())
    }

    /// Detached copy of the full accounting state.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn snapshot(&self) -> Result<StateSnapshot> {
        Ok(self.lock_state()?.snapshot())
    }

    /// Units currently held, one row per process.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn allocation(&self) -> Result<Matrix> {
        Ok(self.lock_state()?.allocation().clone())
    }

    /// Declared maximum simultaneous holdings, one row per process.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn max_claim(&self) -> Result<Matrix> {
        Ok(self.lock_state()?.max_claim().clone())
    }

    /// Units of each resource currently unallocated.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn available(&self) -> Result<Vec<Units>> {
        Ok(self.lock_state()?.available().to_vec())
    }

    /// Fixed per-resource capacity.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn total_units(&self) -> Result<Vec<Units>> {
        Ok(self.lock_state()?.total_units().to_vec())
    }

    /// Remaining claim for one process.
    ///
    /// # Errors
    ///
    /// `UnknownProcess`, or a poisoned state lock.
    pub fn need(&self, process: usize) -> Result<Vec<Units>> {
        Ok(self.lock_state()?.need(process)?)
    }

    /// Whether a safe completion order exists right now.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn is_safe(&self) -> Result<bool> {
        Ok(self.lock_state()?.is_safe())
    }

    /// One witness completion order for the current state, if safe.
    ///
    /// # Errors
    ///
    /// Only a poisoned state lock.
    pub fn safe_sequence(&self) -> Result<Option<Vec<usize>>> {
        Ok(self.lock_state()?.safe_sequence())
    }

    /// Number of registered processes. Fixed at construction.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.shared.processes
    }

    /// Number of resource types. Fixed at construction.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.shared.resources
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, BankerState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| Error::internal("state lock poisoned"))
    }
}

fn log_outcome(process: usize, demand: &[Units], outcome: RequestOutcome) {
    match outcome {
        RequestOutcome::Granted => {
            tracing::debug!("granted {demand:?} to process {process}");
        }
        RequestOutcome::Denied(reason) => {
            tracing::debug!("denied {demand:?} for process {process}: {reason}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> AvoidanceManager {
        AvoidanceManager::from_rows(
            vec![
                vec![0, 1, 0],
                vec![2, 0, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            vec![
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            vec![3, 3, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_clones_share_state() {
        let manager = classic();
        let other = manager.clone();

        assert!(manager.request(1, &[1, 0, 2]).unwrap().is_granted());
        assert_eq!(other.available().unwrap(), vec![2, 3, 0]);
    }

    #[test]
    fn test_counts_fixed_at_construction() {
        let manager = classic();
        assert_eq!(manager.process_count(), 5);
        assert_eq!(manager.resource_count(), 3);
    }

    #[test]
    fn test_granted_state_stays_safe() {
        let manager = classic();
        assert!(manager.request(1, &[1, 0, 2]).unwrap().is_granted());
        assert!(manager.is_safe().unwrap());
        assert!(manager.safe_sequence().unwrap().is_some());
    }

    #[test]
    fn test_unsafe_grant_is_denied() {
        let manager = classic();
        assert!(manager.request(1, &[1, 0, 2]).unwrap().is_granted());

        // Fits numerically (need row 0 is [7,4,3], available [2,3,0])
        // but no completion order would exist afterwards.
        let outcome = manager.request(0, &[0, 2, 0]).unwrap();
        assert_eq!(
            outcome.denied_reason(),
            Some(DeniedReason::UnsafeState)
        );
        assert!(manager.is_safe().unwrap());
    }

    #[test]
    fn test_release_wakes_blocked_requester() {
        let manager = classic();
        assert!(manager.request(1, &[1, 0, 2]).unwrap().is_granted());

        // All of resource 2 is now allocated; [0,0,1] for process 4
        // cannot be granted until someone releases.
        let waiter = {
            let manager = manager.clone();
            std::thread::spawn(move || manager.request_blocking(4, &[0, 0, 1]))
        };

        // Give the waiter a moment to park. Correctness does not depend
        // on the timing: a release before the first evaluation makes the
        // demand grantable outright.
        std::thread::sleep(std::time::Duration::from_millis(50));
        manager.release(1, &[3, 0, 2]).unwrap();

        let outcome = waiter.join().unwrap().unwrap();
        assert!(outcome.is_granted());
        assert_eq!(manager.snapshot().unwrap().allocation[4], vec![0, 0, 3]);
    }

    #[test]
    fn test_blocking_request_returns_immediately_on_overclaim() {
        let manager = classic();
        let outcome = manager.request_blocking(3, &[2, 2, 2]).unwrap();
        assert!(matches!(
            outcome.denied_reason(),
            Some(DeniedReason::ExceedsClaim { .. })
        ));
    }
}
