//! POMDP solver math utilities.

pub mod math;

pub use math::simplex::{
    maximize, Constraint, Options as SimplexOptions, Outcome as SimplexOutcome, Program, Relation,
    SimplexError,
};
pub use math::stable::*;
