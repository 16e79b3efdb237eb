//! Dominance checking over the belief simplex.
//!
//! A vector is dominated when some other vector (or convex combination of
//! others) is at least as good everywhere on the simplex and strictly better
//! somewhere. The check is capability-abstracted behind [`DominanceOracle`]
//! so the pruner can be exercised deterministically without an LP:
//! - [`LpOracle`] — production: a witness LP solved with the dense simplex
//!   from `pomdp-math`
//! - [`GridOracle`] — test double: brute-force over a deterministic grid of
//!   simplex points
//!
//! The witness LP maximizes the margin δ over beliefs b:
//!
//!   max δ  s.t.  b·(w − u) ≥ δ  ∀u accepted,  Σ b = 1,  b ≥ 0
//!
//! δ > tolerance proves a witness point where the candidate `w` strictly
//! beats every accepted vector; otherwise `w` adds nothing over the
//! accepted set.

use crate::belief::Belief;
use crate::solver::vector_set::ValueVector;
use pomdp_math::{
    maximize, Constraint, Program, Relation, SimplexOptions, SimplexOutcome,
};
use thiserror::Error;

/// A dominance check that could not be decided within tolerance.
///
/// Callers must treat this as "not proven dominated" and retain the
/// candidate rather than drop a potentially optimal plan.
#[derive(Debug, Error)]
#[error("dominance check inconclusive: {reason}")]
pub struct DominanceError {
    pub reason: String,
}

/// Outcome of a conclusive dominance check.
#[derive(Debug, Clone)]
pub enum WitnessOutcome {
    /// A belief point where the candidate strictly beats every accepted
    /// vector.
    Witness(Belief),
    /// No such point exists; the candidate is dominated by the accepted set.
    Dominated,
}

/// Seam between the pruner and a specific dominance decision procedure.
pub trait DominanceOracle: Send + Sync {
    fn witness(
        &self,
        candidate: &ValueVector,
        accepted: &[ValueVector],
    ) -> Result<WitnessOutcome, DominanceError>;
}

/// Production oracle: simplex-based witness LP.
#[derive(Debug, Clone)]
pub struct LpOracle {
    /// Minimum margin δ for a witness to count as strict dominance.
    pub margin: f64,
    /// Pivot budget and tableau tolerance for the underlying LP.
    pub simplex: SimplexOptions,
}

impl Default for LpOracle {
    fn default() -> Self {
        Self {
            margin: 1e-9,
            simplex: SimplexOptions::default(),
        }
    }
}

impl DominanceOracle for LpOracle {
    fn witness(
        &self,
        candidate: &ValueVector,
        accepted: &[ValueVector],
    ) -> Result<WitnessOutcome, DominanceError> {
        let states = candidate.len();
        if accepted.is_empty() {
            let belief = Belief::uniform(states)
                .map_err(|e| DominanceError { reason: e.to_string() })?;
            return Ok(WitnessOutcome::Witness(belief));
        }

        // Variables: b_0..b_{n-1}, then the split margin δ = δ⁺ − δ⁻.
        let mut objective = vec![0.0; states + 2];
        objective[states] = 1.0;
        objective[states + 1] = -1.0;

        let mut constraints = Vec::with_capacity(accepted.len() + 1);
        for u in accepted {
            let mut coeffs = Vec::with_capacity(states + 2);
            for s in 0..states {
                coeffs.push(candidate.values()[s] - u.values()[s]);
            }
            coeffs.push(-1.0);
            coeffs.push(1.0);
            constraints.push(Constraint {
                coeffs,
                relation: Relation::Ge,
                rhs: 0.0,
            });
        }
        let mut simplex_row = vec![1.0; states];
        simplex_row.extend_from_slice(&[0.0, 0.0]);
        constraints.push(Constraint {
            coeffs: simplex_row,
            relation: Relation::Eq,
            rhs: 1.0,
        });

        let outcome = maximize(
            &Program {
                objective,
                constraints,
            },
            &self.simplex,
        )
        .map_err(|e| DominanceError {
            reason: e.to_string(),
        })?;

        match outcome {
            SimplexOutcome::Optimal {
                objective,
                solution,
            } => {
                if objective <= self.margin {
                    return Ok(WitnessOutcome::Dominated);
                }
                // Clamp LP roundoff before revalidating as a belief.
                let mut probs: Vec<f64> = solution[..states]
                    .iter()
                    .map(|&p| p.max(0.0))
                    .collect();
                let sum: f64 = probs.iter().sum();
                if sum <= 0.0 {
                    return Err(DominanceError {
                        reason: "witness belief collapsed to zero mass".to_string(),
                    });
                }
                for p in &mut probs {
                    *p /= sum;
                }
                let belief = Belief::from_probs(probs).map_err(|e| DominanceError {
                    reason: format!("witness belief rejected: {e}"),
                })?;
                Ok(WitnessOutcome::Witness(belief))
            }
            // The simplex constraint makes the feasible region a bounded,
            // nonempty polytope; these arise only from numerical collapse.
            SimplexOutcome::Infeasible => Err(DominanceError {
                reason: "witness LP reported infeasible".to_string(),
            }),
            SimplexOutcome::Unbounded => Err(DominanceError {
                reason: "witness LP reported unbounded".to_string(),
            }),
        }
    }
}

/// Test-double oracle: exhaustive check over a deterministic simplex grid.
///
/// Enumerates every belief with components `k / resolution`. Sound for the
/// models used in tests (witnesses found are real); resolution bounds how
/// fine a dominance gap it can detect.
#[derive(Debug, Clone)]
pub struct GridOracle {
    pub resolution: usize,
    pub margin: f64,
}

impl Default for GridOracle {
    fn default() -> Self {
        Self {
            resolution: 16,
            margin: 1e-9,
        }
    }
}

impl GridOracle {
    fn grid(&self, states: usize) -> Vec<Belief> {
        let mut out = Vec::new();
        let mut current = vec![0usize; states];
        compositions(self.resolution, 0, &mut current, &mut out, self.resolution);
        out
    }
}

/// Enumerate all ways to place `remaining` grid units into slots
/// `slot..`, emitting a belief per complete assignment.
fn compositions(
    remaining: usize,
    slot: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Belief>,
    resolution: usize,
) {
    let states = current.len();
    if slot == states - 1 {
        current[slot] = remaining;
        let probs: Vec<f64> = current
            .iter()
            .map(|&k| k as f64 / resolution as f64)
            .collect();
        if let Ok(belief) = Belief::from_probs(probs) {
            out.push(belief);
        }
        return;
    }
    for k in 0..=remaining {
        current[slot] = k;
        compositions(remaining - k, slot + 1, current, out, resolution);
    }
}

impl DominanceOracle for GridOracle {
    fn witness(
        &self,
        candidate: &ValueVector,
        accepted: &[ValueVector],
    ) -> Result<WitnessOutcome, DominanceError> {
        if accepted.is_empty() {
            let belief = Belief::uniform(candidate.len())
                .map_err(|e| DominanceError { reason: e.to_string() })?;
            return Ok(WitnessOutcome::Witness(belief));
        }
        for belief in self.grid(candidate.len()) {
            let candidate_value = candidate.value_at(&belief);
            let beats_all = accepted
                .iter()
                .all(|u| candidate_value > u.value_at(&belief) + self.margin);
            if beats_all {
                return Ok(WitnessOutcome::Witness(belief));
            }
        }
        Ok(WitnessOutcome::Dominated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vv(values: &[f64]) -> ValueVector {
        ValueVector::new(values.to_vec(), 0)
    }

    fn oracles() -> Vec<Box<dyn DominanceOracle>> {
        vec![Box::new(LpOracle::default()), Box::new(GridOracle::default())]
    }

    #[test]
    fn empty_accepted_set_is_trivially_witnessed() {
        for oracle in oracles() {
            let out = oracle.witness(&vv(&[1.0, 2.0]), &[]).unwrap();
            assert!(matches!(out, WitnessOutcome::Witness(_)));
        }
    }

    #[test]
    fn componentwise_dominated_vector_has_no_witness() {
        for oracle in oracles() {
            let out = oracle
                .witness(&vv(&[0.5, 0.5]), &[vv(&[1.0, 1.0])])
                .unwrap();
            assert!(matches!(out, WitnessOutcome::Dominated));
        }
    }

    #[test]
    fn complementary_corners_witness_each_other() {
        for oracle in oracles() {
            let out = oracle
                .witness(&vv(&[1.0, 0.0]), &[vv(&[0.0, 1.0])])
                .unwrap();
            match out {
                WitnessOutcome::Witness(b) => {
                    // The candidate must strictly win at the witness.
                    assert!(b.expect(&[1.0, 0.0]) > b.expect(&[0.0, 1.0]));
                }
                WitnessOutcome::Dominated => panic!("expected witness"),
            }
        }
    }

    #[test]
    fn convex_combination_dominates() {
        // [0.5, 0.5] is the midpoint of [1, 0] and [0, 1]: equal at the
        // centroid belief, worse everywhere else. No strict witness exists.
        for oracle in oracles() {
            let out = oracle
                .witness(&vv(&[0.5, 0.5]), &[vv(&[1.0, 0.0]), vv(&[0.0, 1.0])])
                .unwrap();
            assert!(matches!(out, WitnessOutcome::Dominated));
        }
    }

    #[test]
    fn identical_vector_is_dominated() {
        for oracle in oracles() {
            let out = oracle
                .witness(&vv(&[2.0, 3.0]), &[vv(&[2.0, 3.0])])
                .unwrap();
            assert!(matches!(out, WitnessOutcome::Dominated));
        }
    }

    #[test]
    fn lp_witness_beats_all_accepted() {
        let oracle = LpOracle::default();
        let candidate = vv(&[4.0, 0.0, 0.0]);
        let accepted = [vv(&[0.0, 4.0, 0.0]), vv(&[1.0, 1.0, 1.0])];
        match oracle.witness(&candidate, &accepted).unwrap() {
            WitnessOutcome::Witness(b) => {
                let cv = candidate.value_at(&b);
                for u in &accepted {
                    assert!(cv > u.value_at(&b));
                }
            }
            WitnessOutcome::Dominated => panic!("expected witness"),
        }
    }

    #[test]
    fn lp_pivot_exhaustion_is_inconclusive_not_fatal() {
        let oracle = LpOracle {
            margin: 1e-9,
            simplex: SimplexOptions {
                max_pivots: 0,
                tolerance: 1e-9,
            },
        };
        let result = oracle.witness(&vv(&[1.0, 0.0]), &[vv(&[0.0, 1.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn grid_covers_corners_and_interior() {
        let oracle = GridOracle {
            resolution: 4,
            margin: 1e-9,
        };
        let grid = oracle.grid(3);
        // Compositions of 4 into 3 parts: C(6, 2) = 15.
        assert_eq!(grid.len(), 15);
        assert!(grid.iter().any(|b| b.prob(0) == 1.0));
        assert!(grid.iter().any(|b| (b.prob(1) - 0.5).abs() < 1e-12));
    }
}
