//! Property-based tests for pruning and cross-sum invariants.

use pomdp_core::solver::{
    cross_sum, prune, DominanceOracle, GridOracle, LpOracle, ValueVector, VectorSet,
};
use pomdp_core::Belief;
use proptest::prelude::*;

fn vector_set_strategy(states: usize) -> impl Strategy<Value = VectorSet> {
    prop::collection::vec(
        (
            prop::collection::vec(-10.0f64..10.0, states),
            0usize..3,
        ),
        1..=6,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(values, action)| ValueVector::new(values, action))
            .collect()
    })
}

/// Beliefs on a coarse simplex grid, used to spot-check maximizer
/// preservation after pruning.
fn grid_beliefs(states: usize, resolution: usize) -> Vec<Belief> {
    fn recurse(states: usize, remaining: usize, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if prefix.len() + 1 == states {
            prefix.push(remaining);
            out.push(prefix.clone());
            prefix.pop();
            return;
        }
        for k in 0..=remaining {
            prefix.push(k);
            recurse(states, remaining - k, prefix, out);
            prefix.pop();
        }
    }
    let mut counts = Vec::new();
    recurse(states, resolution, &mut Vec::new(), &mut counts);
    counts
        .into_iter()
        .map(|c| {
            Belief::from_probs(c.iter().map(|&k| k as f64 / resolution as f64).collect())
                .expect("grid point is a distribution")
        })
        .collect()
}

fn assert_maximizer_preserved(original: &VectorSet, pruned: &VectorSet, oracle_name: &str) {
    let states = original.get(0).map(|v| v.len()).unwrap_or(0);
    for belief in grid_beliefs(states, 8) {
        let before = original.max_value_at(&belief).map(|(_, v)| v);
        let after = pruned.max_value_at(&belief).map(|(_, v)| v);
        match (before, after) {
            (Some(b), Some(a)) => assert!(
                (a - b).abs() < 1e-6,
                "{}: max at {:?} changed from {} to {}",
                oracle_name,
                belief.probs(),
                b,
                a
            ),
            (None, None) => {}
            _ => panic!("{}: pruning emptied a non-empty set", oracle_name),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn grid_prune_preserves_maximizers(set in vector_set_strategy(3)) {
        let oracle = GridOracle::default();
        let pruned = prune(&set, &oracle).set;
        prop_assert!(pruned.len() <= set.len());
        assert_maximizer_preserved(&set, &pruned, "grid");
    }

    #[test]
    fn grid_prune_is_idempotent(set in vector_set_strategy(3)) {
        let oracle = GridOracle::default();
        let once = prune(&set, &oracle).set;
        let twice = prune(&once, &oracle).set;
        prop_assert!(once.same_vectors(&twice));
    }

    #[test]
    fn lp_prune_preserves_maximizers(set in vector_set_strategy(2)) {
        let oracle = LpOracle::default();
        let pruned = prune(&set, &oracle).set;
        prop_assert!(pruned.len() <= set.len());
        prop_assert!(!pruned.is_empty());
        assert_maximizer_preserved(&set, &pruned, "lp");
    }

    #[test]
    fn lp_accepts_what_grid_accepts(set in vector_set_strategy(2)) {
        // The grid oracle only sees finitely many beliefs, so anything it
        // keeps must also survive the exact LP.
        let grid = prune(&set, &GridOracle { resolution: 8, margin: 1e-9 }).set;
        let lp = prune(&set, &LpOracle::default()).set;
        let lp_accepts = lp.len() >= grid.len() || grid_beliefs(2, 8).iter().all(|b| {
            let g = grid.max_value_at(b).map(|(_, v)| v);
            let l = lp.max_value_at(b).map(|(_, v)| v);
            matches!((g, l), (Some(g), Some(l)) if (g - l).abs() < 1e-6)
        });
        prop_assert!(lp_accepts);
    }

    #[test]
    fn cross_sum_is_componentwise(
        lhs in vector_set_strategy(3),
        rhs in vector_set_strategy(3),
    ) {
        let summed = cross_sum(&lhs, &rhs);
        prop_assert!(summed.len() <= lhs.len() * rhs.len());

        // Every pairwise sum must be represented (possibly deduplicated).
        for left in lhs.iter() {
            for right in rhs.iter() {
                let expected: Vec<f64> = left
                    .values()
                    .iter()
                    .zip(right.values())
                    .map(|(a, b)| a + b)
                    .collect();
                let found = summed.iter().any(|v| {
                    v.values()
                        .iter()
                        .zip(&expected)
                        .all(|(a, b)| (a - b).abs() < 1e-9)
                });
                prop_assert!(found, "missing sum {:?}", expected);
            }
        }

        // Action tags come from the left operand.
        for v in summed.iter() {
            prop_assert!(lhs.iter().any(|l| l.action() == v.action()));
        }
    }

    #[test]
    fn oracle_empty_accepted_set_yields_witness(values in prop::collection::vec(-10.0f64..10.0, 2)) {
        let candidate = ValueVector::new(values, 0);
        for oracle in [
            &LpOracle::default() as &dyn DominanceOracle,
            &GridOracle::default(),
        ] {
            let outcome = oracle.witness(&candidate, &[]).unwrap();
            prop_assert!(matches!(
                outcome,
                pomdp_core::solver::WitnessOutcome::Witness(_)
            ));
        }
    }
}
