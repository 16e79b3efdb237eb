//! Exact POMDP value iteration via incremental pruning.
//!
//! This library computes the optimal finite- or infinite-horizon value
//! function of a flat, enumerable POMDP as a set of alpha-vectors:
//! - Model container and validation ([`model`])
//! - Belief distributions over states ([`belief`])
//! - The incremental-pruning solver: projection, LP-based dominance pruning,
//!   observation cross-sums, and the value-iteration loop ([`solver`])
//! - Policy queries over a solved value function ([`policy`])
//! - Versioned value-function snapshots ([`persist`])
//!
//! The binary entry point is in `main.rs`.

pub mod belief;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod persist;
pub mod policy;
pub mod solver;

pub use belief::{Belief, BeliefError};
pub use model::{ModelError, Pomdp};
pub use persist::{SnapshotError, ValueFunctionSnapshot};
pub use policy::{BestAction, ValueFunction};
pub use solver::{
    CancelToken, IncrementalPruning, SolverConfig, SolverError, SolverReport, SolverStatus,
};
