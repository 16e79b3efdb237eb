//! Belief distributions over the state space.
//!
//! A belief is a point on the probability simplex: one probability per
//! state, summing to 1. Alpha-vectors are linear functions of belief, so
//! policy queries and dominance witnesses both reduce to dot products
//! against values of this type.

use pomdp_math::dot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from belief construction.
#[derive(Debug, Error)]
pub enum BeliefError {
    #[error("belief must have at least one state")]
    Empty,

    #[error("probability out of range [0, 1]: {0}")]
    ProbabilityOutOfRange(f64),

    #[error("invalid probability distribution: does not sum to 1.0 (sum={0})")]
    InvalidDistribution(f64),

    #[error("belief has {found} states, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// A validated probability distribution over states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Belief {
    probs: Vec<f64>,
}

impl Belief {
    /// Create a belief from probabilities. Validates range and sum.
    pub fn from_probs(probs: Vec<f64>) -> Result<Self, BeliefError> {
        if probs.is_empty() {
            return Err(BeliefError::Empty);
        }
        for &p in &probs {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(BeliefError::ProbabilityOutOfRange(p));
            }
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(BeliefError::InvalidDistribution(sum));
        }
        Ok(Self { probs })
    }

    /// Uniform belief over `states` states.
    pub fn uniform(states: usize) -> Result<Self, BeliefError> {
        if states == 0 {
            return Err(BeliefError::Empty);
        }
        Ok(Self {
            probs: vec![1.0 / states as f64; states],
        })
    }

    /// Belief concentrated on a single state (a simplex corner).
    pub fn corner(state: usize, states: usize) -> Result<Self, BeliefError> {
        if states == 0 || state >= states {
            return Err(BeliefError::DimensionMismatch {
                expected: states,
                found: state,
            });
        }
        let mut probs = vec![0.0; states];
        probs[state] = 1.0;
        Ok(Self { probs })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// True if the belief has no components. Never holds for a validated
    /// belief; present for the conventional `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Probability of a state.
    pub fn prob(&self, state: usize) -> f64 {
        self.probs[state]
    }

    /// Raw probabilities.
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Expected value of a per-state value slice under this belief.
    pub fn expect(&self, values: &[f64]) -> f64 {
        dot(&self.probs, values)
    }

    /// Entropy in nats. Zero at a corner, ln(n) at the uniform belief.
    pub fn entropy(&self) -> f64 {
        -self
            .probs
            .iter()
            .map(|&p| if p > 0.0 { p * p.ln() } else { 0.0 })
            .sum::<f64>()
    }
}

impl TryFrom<Vec<f64>> for Belief {
    type Error = BeliefError;

    fn try_from(probs: Vec<f64>) -> Result<Self, Self::Error> {
        Belief::from_probs(probs)
    }
}

impl From<Belief> for Vec<f64> {
    fn from(belief: Belief) -> Self {
        belief.probs
    }
}
