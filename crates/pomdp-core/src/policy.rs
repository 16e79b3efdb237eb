//! Value functions and belief-point policy queries.
//!
//! A value function is the nondominated set of alpha-vectors for one
//! decision stage. The induced policy is
//! `argmax_a max_{v ∈ set(a)} v·b`; an action with no surviving vectors is
//! never optimal and simply drops out of the query's consideration set.

use crate::belief::{Belief, BeliefError};
use crate::solver::vector_set::{ValueVector, VectorSet};
use serde::Serialize;

/// An immutable value function for one stage of value iteration.
#[derive(Debug, Clone, Serialize)]
pub struct ValueFunction {
    stage: usize,
    vectors: VectorSet,
}

/// Result of a policy query at a belief point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestAction {
    pub action: usize,
    pub value: f64,
}

impl ValueFunction {
    pub fn new(stage: usize, vectors: VectorSet) -> Self {
        Self { stage, vectors }
    }

    /// Decision stage (iteration count) this value function belongs to.
    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn vectors(&self) -> &VectorSet {
        &self.vectors
    }

    /// Surviving plan vectors for one action.
    pub fn vectors_for(&self, action: usize) -> impl Iterator<Item = &ValueVector> {
        self.vectors.iter().filter(move |v| v.action() == action)
    }

    /// Actions with at least one surviving vector, ascending.
    pub fn actions_present(&self) -> Vec<usize> {
        let mut actions: Vec<usize> = self.vectors.iter().map(|v| v.action()).collect();
        actions.sort_unstable();
        actions.dedup();
        actions
    }

    /// Optimal value at a belief point, if any vector survives.
    pub fn value_at(&self, belief: &Belief) -> Result<Option<f64>, BeliefError> {
        self.check_dimension(belief)?;
        Ok(self.vectors.max_value_at(belief).map(|(_, value)| value))
    }

    /// Optimal action and value at a belief point.
    ///
    /// `None` only for an empty value function.
    pub fn best_action(&self, belief: &Belief) -> Result<Option<BestAction>, BeliefError> {
        self.check_dimension(belief)?;
        Ok(self.vectors.max_value_at(belief).map(|(index, value)| {
            BestAction {
                action: self.vectors.vectors()[index].action(),
                value,
            }
        }))
    }

    fn check_dimension(&self, belief: &Belief) -> Result<(), BeliefError> {
        match self.vectors.get(0) {
            Some(v) if v.len() != belief.len() => Err(BeliefError::DimensionMismatch {
                expected: v.len(),
                found: belief.len(),
            }),
            _ => Ok(()),
        }
    }
}
