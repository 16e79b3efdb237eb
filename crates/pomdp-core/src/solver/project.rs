//! Per-(action, observation) Bellman projection.
//!
//! For each vector `v` of the previous value function, the projection for
//! action `a` and observation `o` is
//!
//!   v'[s] = r(s, a) / |O| + γ · Σ_{s'} T(s, a, s') · Z(o, s', a) · v[s']
//!
//! The immediate reward is split evenly across observations and the
//! observation probability is folded in here, so the cross-sum's plain
//! componentwise addition over all observations reconstructs the full
//! backup `r(s, a) + γ Σ_{s'} T Z v`. Changing either side of that
//! convention without the other breaks the Bellman backup.

use crate::model::Pomdp;
use crate::solver::vector_set::{ValueVector, VectorSet};

/// Project the previous value function through one (action, observation)
/// pair. Pure function; output is one candidate vector per input vector
/// (duplicates collapsed), all tagged with `action`.
pub fn project(
    previous: &VectorSet,
    action: usize,
    observation: usize,
    model: &Pomdp,
) -> VectorSet {
    let states = model.states;
    let reward_share = 1.0 / model.observations as f64;

    let mut out = VectorSet::with_capacity(previous.len());
    for v in previous.iter() {
        let mut values = Vec::with_capacity(states);
        for s in 0..states {
            let mut future = 0.0;
            for s2 in 0..states {
                future += model.transition(s, action, s2)
                    * model.observation(observation, s2, action)
                    * v.values()[s2];
            }
            values.push(model.reward(s, action) * reward_share + model.discount * future);
        }
        out.push(ValueVector::new(values, action));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_state_projection_is_geometric_step() {
        let model = Pomdp::single_state(1.0, 0.9).unwrap();
        let prev: VectorSet = [ValueVector::new(vec![1.0], 0)].into_iter().collect();
        let out = project(&prev, 0, 0, &model);
        assert_eq!(out.len(), 1);
        // 1.0 / |O| + 0.9 * 1.0
        assert!((out.get(0).unwrap().values()[0] - 1.9).abs() < 1e-12);
    }

    #[test]
    fn projection_tags_action() {
        let model = Pomdp::tiger(0.95).unwrap();
        let prev: VectorSet = [ValueVector::new(vec![0.0, 0.0], 0)].into_iter().collect();
        let out = project(&prev, 2, 1, &model);
        assert_eq!(out.get(0).unwrap().action(), 2);
    }

    #[test]
    fn projection_folds_observation_probability() {
        let model = Pomdp::tiger(0.95).unwrap();
        // Value 1 in every state isolates the probability mass:
        // future[s] = Σ_s' T(s, listen, s') · Z(o=0, s', listen).
        let prev: VectorSet = [ValueVector::new(vec![1.0, 1.0], 9)].into_iter().collect();
        let out = project(&prev, 0, 0, &model);
        let v = out.get(0).unwrap();
        // From state 0 listening stays in state 0; hear-left there has p=0.85.
        let expected = -1.0 / 2.0 + 0.95 * 0.85;
        assert!((v.values()[0] - expected).abs() < 1e-12);
        // From state 1, hear-left has p=0.15.
        let expected = -1.0 / 2.0 + 0.95 * 0.15;
        assert!((v.values()[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn projection_collapses_duplicate_inputs() {
        // Two distinct inputs that project to the same vector collapse.
        let model = Pomdp::new(
            1,
            1,
            2,
            0.5,
            vec![vec![0.0]],
            vec![vec![vec![1.0]]],
            // Observation 0 never occurs, so its projection zeroes the
            // future term for every input vector.
            vec![vec![vec![0.0, 1.0]]],
        )
        .unwrap();
        let prev: VectorSet = [
            ValueVector::new(vec![1.0], 0),
            ValueVector::new(vec![2.0], 0),
        ]
        .into_iter()
        .collect();
        let out = project(&prev, 0, 0, &model);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0).unwrap().values()[0], 0.0);
    }
}
