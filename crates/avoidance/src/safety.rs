//! Banker's safety check
//!
//! A state is safe when at least one order exists in which every process
//! can acquire its full claim and then release everything it holds. The
//! check is a fixed-point computation over copies of the inputs: it
//! simulates handing each satisfiable process its need, letting it
//! finish, and reclaiming its allocation, until either every process has
//! finished or a full pass makes no progress. Safety is existential over
//! orderings — the returned order is one witness, not a schedule promise.
//!
//! Worst case O(P² × R): up to P passes, each scanning P processes over R
//! resources. P and R are small in practice, so the caller can afford to
//! hold its lock across the call.

use resguard_types::{Matrix, Units};

/// Find one order in which all processes can run to completion, given
/// `work` units initially free. Returns `None` if no such order exists.
///
/// `allocation` and `max_claim` must be P×R with `work` of length R;
/// callers validate shapes before reaching this point.
#[must_use]
pub fn safe_sequence(
    allocation: &Matrix,
    max_claim: &Matrix,
    work: &[Units],
) -> Option<Vec<usize>> {
    let processes = allocation.row_count();
    let mut work = work.to_vec();
    let mut finished = vec![false; processes];
    let mut order = Vec::with_capacity(processes);

    loop {
        let mut progressed = false;

        for process in 0..processes {
            if finished[process] {
                continue;
            }

            let need_fits = max_claim
                .row(process)
                .iter()
                .zip(allocation.row(process))
                .zip(&work)
                .all(|((claim, held), free)| claim - held <= *free);

            if need_fits {
                // The process runs to completion and returns its
                // allocation to the pool.
                for (free, held) in work.iter_mut().zip(allocation.row(process)) {
                    *free += held;
                }
                finished[process] = true;
                order.push(process);
                progressed = true;
            }
        }

        if order.len() == processes {
            return Some(order);
        }
        if !progressed {
            return None;
        }
    }
}

/// Whether any safe completion order exists.
#[must_use]
pub fn is_safe(allocation: &Matrix, max_claim: &Matrix, work: &[Units]) -> bool {
    safe_sequence(allocation, max_claim, work).is_some()
}
