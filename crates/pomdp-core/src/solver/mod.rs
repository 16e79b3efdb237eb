//! Incremental-pruning value iteration.
//!
//! Each iteration backs the previous value function up one decision stage:
//!
//! 1. For every (action, observation) pair, project the previous vectors
//!    and prune the result. The pairs share no mutable state and run as
//!    independent fork-join tasks on scoped worker threads.
//! 2. Per action, fold the per-observation sets together with the
//!    cross-sum, pruning the running union after each fold — pruning early
//!    is what keeps the multiplicative cross-sum tractable.
//! 3. Union all actions' sets and prune globally. The survivors are the
//!    next value function.
//!
//! Iteration stops at a fixed horizon, at convergence of the Bellman
//! residual (infinite-horizon mode, discount < 1), or on external
//! cancellation — which returns the best value function computed so far,
//! never a torn iteration.

pub mod cross_sum;
pub mod dominance;
pub mod project;
pub mod prune;
pub mod vector_set;

pub use cross_sum::cross_sum;
pub use dominance::{DominanceError, DominanceOracle, GridOracle, LpOracle, WitnessOutcome};
pub use project::project;
pub use prune::{prune, PruneOutcome};
pub use vector_set::{ValueVector, VectorSet, DEDUP_TOLERANCE};

use crate::model::{ModelError, Pomdp};
use crate::policy::ValueFunction;
use pomdp_math::SimplexOptions;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

// ── Errors ───────────────────────────────────────────────────────────────

/// Errors from solver setup and execution.
///
/// LP degeneracy is deliberately absent: it is recovered inside the pruner
/// (conservative retention) and only surfaces as a counter in the report.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("invalid solver config: {0}")]
    InvalidConfig(String),

    #[error("infinite-horizon mode requires discount < 1 (got {0}); set a horizon")]
    UndiscountedWithoutHorizon(f64),

    #[error("solver worker thread panicked")]
    WorkerPanicked,
}

// ── Configuration ────────────────────────────────────────────────────────

/// Configuration for the incremental-pruning solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Fixed number of iterations (finite-horizon mode). `None` iterates to
    /// convergence, which requires discount < 1.
    pub horizon: Option<usize>,

    /// Convergence tolerance on the Bellman residual between successive
    /// value functions (infinite-horizon mode).
    pub tolerance: f64,

    /// Worker-thread cap for the fork-join stages.
    pub max_parallel: usize,

    /// Minimum LP margin for a dominance witness to count as strict.
    pub witness_margin: f64,

    /// Pivot budget per witness LP; exhaustion falls back to retaining the
    /// vector under test.
    pub max_lp_pivots: usize,

    /// Optional wall-clock budget; exceeding it cancels between iterations.
    pub time_budget_secs: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            horizon: None,
            tolerance: 1e-6,
            max_parallel: 4,
            witness_margin: 1e-9,
            max_lp_pivots: 10_000,
            time_budget_secs: None,
        }
    }
}

impl SolverConfig {
    fn validate(&self) -> Result<(), SolverError> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(SolverError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_parallel == 0 {
            return Err(SolverError::InvalidConfig(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if !(self.witness_margin >= 0.0 && self.witness_margin.is_finite()) {
            return Err(SolverError::InvalidConfig(format!(
                "witness_margin must be non-negative and finite, got {}",
                self.witness_margin
            )));
        }
        Ok(())
    }
}

// ── Status and cancellation ──────────────────────────────────────────────

/// Solver state machine. A report always carries a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Initializing,
    Iterating,
    Converged,
    HorizonReached,
    Cancelled,
}

/// Cloneable cancellation handle, checked between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ── Report ───────────────────────────────────────────────────────────────

/// Outcome of a solve: terminal status, diagnostics, and the value function.
#[derive(Debug, Clone, Serialize)]
pub struct SolverReport {
    pub status: SolverStatus,
    /// Iterations completed (stage of the returned value function).
    pub iterations: usize,
    /// Bellman residual of the final iteration, if any iteration ran.
    pub residual: Option<f64>,
    /// Dominance checks that came back inconclusive and fell back to
    /// conservative retention.
    pub degenerate_checks: usize,
    pub elapsed_ms: u64,
    pub value_function: ValueFunction,
}

// ── Solver ───────────────────────────────────────────────────────────────

/// Exact POMDP value iteration via incremental pruning.
#[derive(Debug, Clone)]
pub struct IncrementalPruning {
    config: SolverConfig,
}

struct StepOutcome {
    set: VectorSet,
    degenerate_checks: usize,
}

impl IncrementalPruning {
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve to termination with the production LP oracle.
    pub fn solve(&self, model: &Pomdp) -> Result<SolverReport, SolverError> {
        self.solve_cancellable(model, &CancelToken::new())
    }

    /// Solve with the production LP oracle and an external cancel handle.
    pub fn solve_cancellable(
        &self,
        model: &Pomdp,
        cancel: &CancelToken,
    ) -> Result<SolverReport, SolverError> {
        let oracle = LpOracle {
            margin: self.config.witness_margin,
            simplex: SimplexOptions {
                max_pivots: self.config.max_lp_pivots,
                ..SimplexOptions::default()
            },
        };
        self.solve_with(model, &oracle, cancel)
    }

    /// Solve with an explicit dominance oracle.
    pub fn solve_with(
        &self,
        model: &Pomdp,
        oracle: &dyn DominanceOracle,
        cancel: &CancelToken,
    ) -> Result<SolverReport, SolverError> {
        let start = Instant::now();
        model.validate()?;
        if self.config.horizon.is_none() && model.discount >= 1.0 {
            return Err(SolverError::UndiscountedWithoutHorizon(model.discount));
        }

        info!(
            states = model.states,
            actions = model.actions,
            observations = model.observations,
            discount = model.discount,
            horizon = ?self.config.horizon,
            "starting incremental pruning"
        );

        let deadline = self
            .config
            .time_budget_secs
            .map(|secs| start + Duration::from_secs(secs));
        let mut current = initial_value_function(model);
        let mut iterations = 0;
        let mut residual = None;
        let mut degenerate_checks = 0;

        let status = loop {
            if let Some(horizon) = self.config.horizon {
                if iterations >= horizon {
                    break SolverStatus::HorizonReached;
                }
            }
            if cancel.is_cancelled() {
                break SolverStatus::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break SolverStatus::Cancelled;
            }

            let step = self.step(model, current.vectors(), oracle)?;
            degenerate_checks += step.degenerate_checks;
            let step_residual = current.vectors().set_distance(&step.set);
            iterations += 1;
            current = ValueFunction::new(iterations, step.set);
            residual = Some(step_residual);

            debug!(
                iteration = iterations,
                residual = step_residual,
                vectors = current.vectors().len(),
                "completed iteration"
            );

            if self.config.horizon.is_none() && step_residual <= self.config.tolerance {
                break SolverStatus::Converged;
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            ?status,
            iterations,
            vectors = current.vectors().len(),
            degenerate_checks,
            elapsed_ms,
            "solver finished"
        );

        Ok(SolverReport {
            status,
            iterations,
            residual,
            degenerate_checks,
            elapsed_ms,
            value_function: current,
        })
    }

    /// One full backup: project/prune per (a, o), incremental cross-sum per
    /// action, then global prune.
    fn step(
        &self,
        model: &Pomdp,
        previous: &VectorSet,
        oracle: &dyn DominanceOracle,
    ) -> Result<StepOutcome, SolverError> {
        let mut degenerate_checks = 0;

        // Stage 1: independent projector + pruner tasks.
        let pairs: Vec<(usize, usize)> = (0..model.actions)
            .flat_map(|a| (0..model.observations).map(move |o| (a, o)))
            .collect();
        let projections = self.run_parallel(&pairs, |&(action, observation)| {
            let projected = project(previous, action, observation, model);
            prune(&projected, oracle)
        })?;
        degenerate_checks += projections
            .iter()
            .map(|p| p.degenerate_checks)
            .sum::<usize>();

        // Stage 2: per-action incremental fold. Pairs are action-major, so
        // action a's observation sets are a contiguous slice.
        let actions: Vec<usize> = (0..model.actions).collect();
        let folds = self.run_parallel(&actions, |&action| {
            let sets = &projections[action * model.observations..][..model.observations];
            let mut acc = sets[0].set.clone();
            let mut degenerate = 0;
            for next in &sets[1..] {
                let summed = cross_sum(&acc, &next.set);
                let pruned = prune(&summed, oracle);
                degenerate += pruned.degenerate_checks;
                acc = pruned.set;
            }
            (acc, degenerate)
        })?;

        // Stage 3: union across actions, global prune. The union's dedup
        // keeps the first-seen action tag for vectors shared by actions.
        let mut union = VectorSet::new();
        for (set, degenerate) in folds {
            degenerate_checks += degenerate;
            for v in set.iter() {
                union.push(v.clone());
            }
        }
        let global = prune(&union, oracle);
        degenerate_checks += global.degenerate_checks;

        Ok(StepOutcome {
            set: global.set,
            degenerate_checks,
        })
    }

    /// Fork-join map over `items` on scoped threads, at most `max_parallel`
    /// in flight at a time.
    fn run_parallel<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, SolverError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let f = &f;
        let mut results = Vec::with_capacity(items.len());
        for chunk in items.chunks(self.config.max_parallel) {
            let joined: Vec<Result<R, SolverError>> = thread::scope(|s| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|item| s.spawn(move || f(item)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().map_err(|_| SolverError::WorkerPanicked))
                    .collect()
            });
            for r in joined {
                results.push(r?);
            }
        }
        Ok(results)
    }
}

/// Horizon-0 baseline: one vector per action, equal to that action's
/// immediate reward row (duplicates collapse).
pub fn initial_value_function(model: &Pomdp) -> ValueFunction {
    let mut set = VectorSet::with_capacity(model.actions);
    for a in 0..model.actions {
        let values: Vec<f64> = (0..model.states).map(|s| model.reward(s, a)).collect();
        set.push(ValueVector::new(values, a));
    }
    ValueFunction::new(0, set)
}
