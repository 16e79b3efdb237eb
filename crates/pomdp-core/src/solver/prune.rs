//! Witness-based pruning of dominated vectors (Lark's filtering).
//!
//! Repeatedly takes an unprocessed candidate and asks the oracle for a
//! belief point where it strictly beats every accepted vector. When a
//! witness exists, the candidate that is best at that witness is accepted
//! (first-seen tie-break); when none exists the candidate is discarded.
//! Every vector that is the unique maximizer somewhere on the simplex
//! survives.
//!
//! An inconclusive oracle (LP degeneracy, pivot exhaustion) must never
//! cost us a potentially optimal plan: the candidate is retained, the
//! event is logged, and solving continues.

use crate::solver::dominance::{DominanceOracle, WitnessOutcome};
use crate::solver::vector_set::VectorSet;
use tracing::{debug, warn};

/// A pruned set plus how many dominance checks came back inconclusive.
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    pub set: VectorSet,
    pub degenerate_checks: usize,
}

/// Reduce `set` to its nondominated subset.
pub fn prune(set: &VectorSet, oracle: &dyn DominanceOracle) -> PruneOutcome {
    if set.len() <= 1 {
        return PruneOutcome {
            set: set.clone(),
            degenerate_checks: 0,
        };
    }

    let mut remaining: Vec<_> = set.iter().cloned().collect();
    let mut accepted = VectorSet::with_capacity(remaining.len());
    let mut degenerate_checks = 0;

    while !remaining.is_empty() {
        let candidate = &remaining[0];
        match oracle.witness(candidate, accepted.vectors()) {
            Ok(WitnessOutcome::Dominated) => {
                remaining.remove(0);
            }
            Ok(WitnessOutcome::Witness(belief)) => {
                // Accept the vector that is best at the witness point; it
                // beats every accepted vector there at least as well as the
                // candidate does.
                let mut best_index = 0;
                let mut best_value = remaining[0].value_at(&belief);
                for (i, v) in remaining.iter().enumerate().skip(1) {
                    let value = v.value_at(&belief);
                    if value > best_value {
                        best_index = i;
                        best_value = value;
                    }
                }
                accepted.push(remaining.remove(best_index));
            }
            Err(e) => {
                // Conservative retention: inconclusive is not dominated.
                warn!(reason = %e, "dominance check inconclusive; retaining vector");
                degenerate_checks += 1;
                let kept = remaining.remove(0);
                accepted.push(kept);
            }
        }
    }

    debug!(
        input = set.len(),
        surviving = accepted.len(),
        degenerate_checks,
        "pruned vector set"
    );
    PruneOutcome {
        set: accepted,
        degenerate_checks,
    }
}
