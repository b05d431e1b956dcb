//! Property tests for the accounting state
//!
//! Checks the algebraic guarantees over arbitrary systems and call
//! sequences: conservation of totals, the claim bound, no negative
//! counts, denials leaving state untouched, and grants landing only in
//! safe states.

use proptest::prelude::*;
use resguard_avoidance::BankerState;
use resguard_types::Matrix;

/// An arbitrary valid system. Each cell is drawn as a (claim, held)
/// pair with the held units clamped under the claim, so construction
/// never fails.
fn arb_state() -> impl Strategy<Value = BankerState> {
    (1usize..=5, 1usize..=4).prop_flat_map(|(processes, resources)| {
        (
            prop::collection::vec(
                prop::collection::vec((0i64..=6, 0i64..=6), resources),
                processes,
            ),
            prop::collection::vec(0i64..=5, resources),
        )
            .prop_map(|(cells, available)| {
                let max_claim: Vec<Vec<i64>> = cells
                    .iter()
                    .map(|row| row.iter().map(|(claim, _)| *claim).collect())
                    .collect();
                let allocation: Vec<Vec<i64>> = cells
                    .iter()
                    .map(|row| row.iter().map(|(claim, held)| (*held).min(*claim)).collect())
                    .collect();
                BankerState::new(
                    Matrix::from_rows(allocation).unwrap(),
                    Matrix::from_rows(max_claim).unwrap(),
                    available,
                )
                .unwrap()
            })
    })
}

/// Call sequences; process indices and vector lengths are folded into
/// range at apply time.
fn arb_ops() -> impl Strategy<Value = Vec<(bool, usize, Vec<i64>)>> {
    prop::collection::vec(
        (
            any::<bool>(),
            0usize..5,
            prop::collection::vec(0i64..=4, 1..=4),
        ),
        1..=25,
    )
}

proptest! {
    #[test]
    fn prop_invariants_survive_any_sequence(state in arb_state(), ops in arb_ops()) {
        let mut state = state;
        let totals = state.total_units().to_vec();

        for (is_request, process, mut vector) in ops {
            let process = process % state.process_count();
            vector.resize(state.resource_count(), 0);
            let before = state.clone();

            if is_request {
                let outcome = state.request(process, &vector).unwrap();
                if outcome.is_granted() {
                    // Safety guarantee: a grant never lands in an
                    // unprovable state.
                    prop_assert!(state.is_safe());
                } else {
                    prop_assert_eq!(&state, &before);
                }
            } else if state.release(process, &vector).is_err() {
                prop_assert_eq!(&state, &before);
            }

            let snap = state.snapshot();
            prop_assert!(snap.is_consistent());
            prop_assert_eq!(&snap.total_units, &totals);
            prop_assert!(snap.available.iter().all(|units| *units >= 0));
            prop_assert!(snap
                .allocation
                .iter()
                .flatten()
                .all(|units| *units >= 0));

            // Claim bound: need never goes negative anywhere.
            for p in 0..state.process_count() {
                let need = state.need(p).unwrap();
                prop_assert!(need.iter().all(|units| *units >= 0));
            }
        }
    }

    #[test]
    fn prop_replay_is_deterministic(state in arb_state(), ops in arb_ops()) {
        let mut first = state.clone();
        let mut second = state;
        for (is_request, process, mut vector) in ops {
            let process = process % first.process_count();
            vector.resize(first.resource_count(), 0);

            if is_request {
                let a = first.request(process, &vector).unwrap();
                let b = second.request(process, &vector).unwrap();
                prop_assert_eq!(a, b);
            } else {
                let a = first.release(process, &vector);
                let b = second.release(process, &vector);
                prop_assert_eq!(a.is_ok(), b.is_ok());
            }
            prop_assert_eq!(&first, &second);
        }
    }

    #[test]
    fn prop_fresh_construction_is_consistent(state in arb_state()) {
        let snap = state.snapshot();
        prop_assert!(snap.is_consistent());
        prop_assert_eq!(snap.process_count(), state.process_count());
        prop_assert_eq!(snap.resource_count(), state.resource_count());
    }
}
