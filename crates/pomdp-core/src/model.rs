//! POMDP model container and validation.
//!
//! A model is supplied by a collaborator (or loaded from JSON) as flat,
//! enumerable, 0-indexed state/action/observation spaces with dense
//! probability tables:
//! - `transition[s][a][s']` = P(s' | s, a), rows summing to 1 per (s, a)
//! - `observation[a][s'][o]` = P(o | s', a), summing to 1 over o per (s', a)
//! - `reward[s][a]` = immediate reward for taking a in s
//!
//! Validation runs before any iteration begins; a model that fails it is
//! fatal (`ModelError`), never silently repaired.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for probability row sums.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Errors from model construction and validation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("state, action, and observation counts must all be positive")]
    EmptyModel,

    #[error("{table} table has the wrong shape for the declared counts")]
    Shape { table: &'static str },

    #[error("{table} table contains a non-finite entry")]
    NonFinite { table: &'static str },

    #[error("{table} probability out of range [0, 1]: {value}")]
    ProbabilityOutOfRange { table: &'static str, value: f64 },

    #[error("transition row (state={state}, action={action}) sums to {sum}, expected 1")]
    TransitionRowSum {
        state: usize,
        action: usize,
        sum: f64,
    },

    #[error(
        "observation row (action={action}, next_state={next_state}) sums to {sum}, expected 1"
    )]
    ObservationRowSum {
        action: usize,
        next_state: usize,
        sum: f64,
    },

    #[error("discount factor {0} out of range (0, 1]")]
    InvalidDiscount(f64),
}

/// A flat POMDP model.
///
/// Fields are public for serde and collaborator construction; call
/// [`Pomdp::validate`] before solving. The solver does so itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pomdp {
    /// Number of states.
    pub states: usize,
    /// Number of actions.
    pub actions: usize,
    /// Number of observations.
    pub observations: usize,
    /// Discount factor in (0, 1]. Infinite-horizon convergence requires < 1.
    pub discount: f64,
    /// Immediate reward, indexed `[state][action]`.
    pub reward: Vec<Vec<f64>>,
    /// Transition probabilities, indexed `[state][action][next_state]`.
    pub transition: Vec<Vec<Vec<f64>>>,
    /// Observation probabilities, indexed `[action][next_state][observation]`.
    pub observation: Vec<Vec<Vec<f64>>>,
}

impl Pomdp {
    /// Construct and validate in one step.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        states: usize,
        actions: usize,
        observations: usize,
        discount: f64,
        reward: Vec<Vec<f64>>,
        transition: Vec<Vec<Vec<f64>>>,
        observation: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self, ModelError> {
        let model = Self {
            states,
            actions,
            observations,
            discount,
            reward,
            transition,
            observation,
        };
        model.validate()?;
        Ok(model)
    }

    /// Immediate reward for taking `action` in `state`.
    pub fn reward(&self, state: usize, action: usize) -> f64 {
        self.reward[state][action]
    }

    /// P(next_state | state, action).
    pub fn transition(&self, state: usize, action: usize, next_state: usize) -> f64 {
        self.transition[state][action][next_state]
    }

    /// P(observation | next_state, action).
    pub fn observation(&self, observation: usize, next_state: usize, action: usize) -> f64 {
        self.observation[action][next_state][observation]
    }

    /// Check every invariant the solver relies on.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.states == 0 || self.actions == 0 || self.observations == 0 {
            return Err(ModelError::EmptyModel);
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(ModelError::InvalidDiscount(self.discount));
        }

        if self.reward.len() != self.states
            || self.reward.iter().any(|row| row.len() != self.actions)
        {
            return Err(ModelError::Shape { table: "reward" });
        }
        for row in &self.reward {
            if row.iter().any(|r| !r.is_finite()) {
                return Err(ModelError::NonFinite { table: "reward" });
            }
        }

        if self.transition.len() != self.states
            || self.transition.iter().any(|per_action| {
                per_action.len() != self.actions
                    || per_action.iter().any(|row| row.len() != self.states)
            })
        {
            return Err(ModelError::Shape { table: "transition" });
        }
        for (s, per_action) in self.transition.iter().enumerate() {
            for (a, row) in per_action.iter().enumerate() {
                check_prob_row(row, "transition")?;
                let sum: f64 = row.iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(ModelError::TransitionRowSum {
                        state: s,
                        action: a,
                        sum,
                    });
                }
            }
        }

        if self.observation.len() != self.actions
            || self.observation.iter().any(|per_state| {
                per_state.len() != self.states
                    || per_state.iter().any(|row| row.len() != self.observations)
            })
        {
            return Err(ModelError::Shape {
                table: "observation",
            });
        }
        for (a, per_state) in self.observation.iter().enumerate() {
            for (s2, row) in per_state.iter().enumerate() {
                check_prob_row(row, "observation")?;
                let sum: f64 = row.iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(ModelError::ObservationRowSum {
                        action: a,
                        next_state: s2,
                        sum,
                    });
                }
            }
        }

        Ok(())
    }

    /// Smallest nontrivial model: one state, one action, one observation.
    ///
    /// Value iteration on it is the geometric series
    /// `reward / (1 - discount)`, which pins down the normalization
    /// convention used by the projection/cross-sum pair.
    pub fn single_state(reward: f64, discount: f64) -> Result<Self, ModelError> {
        Self::new(
            1,
            1,
            1,
            discount,
            vec![vec![reward]],
            vec![vec![vec![1.0]]],
            vec![vec![vec![1.0]]],
        )
    }

    /// The classic tiger problem (Kaelbling, Littman & Cassandra).
    ///
    /// Two states (tiger left / tiger right), three actions (listen,
    /// open-left, open-right), two observations (hear left / hear right).
    pub fn tiger(discount: f64) -> Result<Self, ModelError> {
        let uniform = vec![0.5, 0.5];
        Self::new(
            2,
            3,
            2,
            discount,
            vec![
                vec![-1.0, -100.0, 10.0],
                vec![-1.0, 10.0, -100.0],
            ],
            vec![
                // Listening leaves the tiger in place; opening resets.
                vec![vec![1.0, 0.0], uniform.clone(), uniform.clone()],
                vec![vec![0.0, 1.0], uniform.clone(), uniform.clone()],
            ],
            vec![
                // Listen: 85% accurate.
                vec![vec![0.85, 0.15], vec![0.15, 0.85]],
                // Opening a door is uninformative.
                vec![uniform.clone(), uniform.clone()],
                vec![uniform.clone(), uniform],
            ],
        )
    }
}

fn check_prob_row(row: &[f64], table: &'static str) -> Result<(), ModelError> {
    for &p in row {
        if !p.is_finite() {
            return Err(ModelError::NonFinite { table });
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::ProbabilityOutOfRange { table, value: p });
        }
    }
    Ok(())
}
