//! Dense two-phase simplex solver for small linear programs.
//!
//! Solves `maximize c·x` subject to `A x {≤,=,≥} b`, `x ≥ 0`, on an explicit
//! tableau. The programs this crate exists for are tiny (one row per accepted
//! value vector, one column per state), so a dense tableau with Bland's
//! anti-cycling pivot rule is both simple and fast enough.
//!
//! The solver never panics on degenerate input: exceeding the pivot budget
//! surfaces as [`SimplexError::PivotLimit`], and infeasible or unbounded
//! programs are reported as ordinary [`Outcome`] variants.

use thiserror::Error;

/// Errors from simplex solving.
#[derive(Debug, Error)]
pub enum SimplexError {
    #[error("constraint {index} has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("program contains a non-finite coefficient")]
    NonFinite,

    #[error("program has no variables")]
    Empty,

    #[error("pivot limit of {0} reached before convergence")]
    PivotLimit(usize),
}

/// Relation between a constraint row and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

/// A single linear constraint `coeffs · x <relation> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub coeffs: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64,
}

/// A linear program: maximize `objective · x` subject to the constraints,
/// with all variables non-negative.
#[derive(Debug, Clone)]
pub struct Program {
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

/// Result of solving a program.
#[derive(Debug, Clone)]
pub enum Outcome {
    Optimal { objective: f64, solution: Vec<f64> },
    Infeasible,
    Unbounded,
}

/// Solver knobs.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Total pivot budget across both phases.
    pub max_pivots: usize,
    /// Numerical tolerance for reduced costs, ratio tests, and feasibility.
    pub tolerance: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_pivots: 10_000,
            tolerance: 1e-9,
        }
    }
}

enum Phase {
    Optimal,
    Unbounded,
}

/// Maximize `program.objective · x` over the feasible region.
pub fn maximize(program: &Program, options: &Options) -> Result<Outcome, SimplexError> {
    let n = program.objective.len();
    if n == 0 {
        return Err(SimplexError::Empty);
    }
    if program.objective.iter().any(|c| !c.is_finite()) {
        return Err(SimplexError::NonFinite);
    }
    for (index, c) in program.constraints.iter().enumerate() {
        if c.coeffs.len() != n {
            return Err(SimplexError::DimensionMismatch {
                index,
                expected: n,
                found: c.coeffs.len(),
            });
        }
        if !c.rhs.is_finite() || c.coeffs.iter().any(|v| !v.is_finite()) {
            return Err(SimplexError::NonFinite);
        }
    }

    // Normalize so every rhs is non-negative; flip the relation when a row
    // is negated.
    let rows: Vec<(Vec<f64>, Relation, f64)> = program
        .constraints
        .iter()
        .map(|c| {
            if c.rhs < 0.0 {
                let flipped = match c.relation {
                    Relation::Le => Relation::Ge,
                    Relation::Ge => Relation::Le,
                    Relation::Eq => Relation::Eq,
                };
                (c.coeffs.iter().map(|v| -v).collect(), flipped, -c.rhs)
            } else {
                (c.coeffs.clone(), c.relation, c.rhs)
            }
        })
        .collect();

    let m = rows.len();
    let n_slack = rows
        .iter()
        .filter(|(_, rel, _)| matches!(rel, Relation::Le | Relation::Ge))
        .count();
    let n_art = rows
        .iter()
        .filter(|(_, rel, _)| matches!(rel, Relation::Ge | Relation::Eq))
        .count();
    let art_start = n + n_slack;
    let total = n + n_slack + n_art;

    // Build the tableau: [vars | slacks | artificials | rhs].
    let mut tab = vec![vec![0.0; total + 1]; m];
    let mut basis = vec![0usize; m];
    let mut slack_col = n;
    let mut art_col = art_start;
    for (i, (coeffs, rel, rhs)) in rows.iter().enumerate() {
        tab[i][..n].copy_from_slice(coeffs);
        tab[i][total] = *rhs;
        match rel {
            Relation::Le => {
                tab[i][slack_col] = 1.0;
                basis[i] = slack_col;
                slack_col += 1;
            }
            Relation::Ge => {
                tab[i][slack_col] = -1.0;
                slack_col += 1;
                tab[i][art_col] = 1.0;
                basis[i] = art_col;
                art_col += 1;
            }
            Relation::Eq => {
                tab[i][art_col] = 1.0;
                basis[i] = art_col;
                art_col += 1;
            }
        }
    }

    let mut budget = options.max_pivots;

    // Phase 1: drive the artificial variables to zero.
    if n_art > 0 {
        let mut phase1_cost = vec![0.0; total];
        for c in phase1_cost.iter_mut().skip(art_start) {
            *c = -1.0;
        }
        match run_phase(&mut tab, &mut basis, &phase1_cost, total, options, &mut budget)? {
            Phase::Optimal => {}
            // Phase-1 objective is bounded by zero; treat anything else as
            // an infeasible artifact of roundoff.
            Phase::Unbounded => return Ok(Outcome::Infeasible),
        }

        let residual: f64 = basis
            .iter()
            .enumerate()
            .filter(|(_, &b)| b >= art_start)
            .map(|(i, _)| tab[i][total])
            .sum();
        if residual > options.tolerance {
            return Ok(Outcome::Infeasible);
        }

        // Pivot any zero-valued artificials out of the basis so phase 2
        // cannot reintroduce them.
        for i in 0..m {
            if basis[i] < art_start {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| tab[i][j].abs() > options.tolerance) {
                pivot(&mut tab, &mut basis, i, j);
            }
        }
    }

    // Phase 2: the real objective, artificial columns barred from entering.
    let mut cost = vec![0.0; total];
    cost[..n].copy_from_slice(&program.objective);
    match run_phase(&mut tab, &mut basis, &cost, art_start, options, &mut budget)? {
        Phase::Unbounded => return Ok(Outcome::Unbounded),
        Phase::Optimal => {}
    }

    let mut solution = vec![0.0; n];
    for (i, &b) in basis.iter().enumerate() {
        if b < n {
            solution[b] = tab[i][total];
        }
    }
    let objective = crate::math::stable::dot(&program.objective, &solution);
    Ok(Outcome::Optimal {
        objective,
        solution,
    })
}

/// Run simplex pivots with the given cost vector until optimal or unbounded.
/// Only columns below `enter_limit` may enter the basis.
fn run_phase(
    tab: &mut [Vec<f64>],
    basis: &mut [usize],
    cost: &[f64],
    enter_limit: usize,
    options: &Options,
    budget: &mut usize,
) -> Result<Phase, SimplexError> {
    let m = tab.len();
    let rhs_col = cost.len();

    loop {
        // Bland's rule: smallest-index column with positive reduced cost.
        let entering = (0..enter_limit).find(|&j| {
            let mut rc = cost[j];
            for i in 0..m {
                rc -= cost[basis[i]] * tab[i][j];
            }
            rc > options.tolerance
        });
        let Some(col) = entering else {
            return Ok(Phase::Optimal);
        };

        // Ratio test, ties broken by smallest basis index.
        let mut leaving: Option<(usize, f64)> = None;
        for i in 0..m {
            if tab[i][col] > options.tolerance {
                let ratio = tab[i][rhs_col] / tab[i][col];
                let better = match leaving {
                    None => true,
                    Some((prev, best)) => {
                        ratio < best - options.tolerance
                            || (ratio <= best + options.tolerance && basis[i] < basis[prev])
                    }
                };
                if better {
                    leaving = Some((i, ratio));
                }
            }
        }
        let Some((row, _)) = leaving else {
            return Ok(Phase::Unbounded);
        };

        if *budget == 0 {
            return Err(SimplexError::PivotLimit(options.max_pivots));
        }
        *budget -= 1;
        pivot(tab, basis, row, col);
    }
}

fn pivot(tab: &mut [Vec<f64>], basis: &mut [usize], row: usize, col: usize) {
    let inv = 1.0 / tab[row][col];
    for v in tab[row].iter_mut() {
        *v *= inv;
    }
    for i in 0..tab.len() {
        if i == row {
            continue;
        }
        let factor = tab[i][col];
        if factor != 0.0 {
            for j in 0..tab[row].len() {
                tab[i][j] -= factor * tab[row][j];
            }
        }
    }
    basis[row] = col;
}
