//! Alpha-vectors and duplicate-free vector sets.
//!
//! A [`ValueVector`] is one scalar per state — the expected return from each
//! state under a fixed conditional plan — tagged with the action that roots
//! the plan. Vectors are immutable once constructed; value iteration only
//! ever builds new sets from old ones.
//!
//! A [`VectorSet`] keeps first-seen insertion order and rejects
//! componentwise-equal duplicates, so ties collapse to the first vector
//! encountered (whose action tag wins).

use crate::belief::Belief;
use pomdp_math::{linf_distance, slices_approx_eq};
use serde::Serialize;

/// Tolerance for treating two vectors as componentwise equal.
pub const DEDUP_TOLERANCE: f64 = 1e-9;

/// An immutable alpha-vector tagged with its originating action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueVector {
    values: Vec<f64>,
    action: usize,
}

impl ValueVector {
    pub fn new(values: Vec<f64>, action: usize) -> Self {
        Self { values, action }
    }

    /// Per-state values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Originating action.
    pub fn action(&self) -> usize {
        self.action
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of this vector at a belief point.
    pub fn value_at(&self, belief: &Belief) -> f64 {
        belief.expect(&self.values)
    }

    /// Componentwise equality under [`DEDUP_TOLERANCE`].
    pub fn approx_eq(&self, other: &ValueVector) -> bool {
        slices_approx_eq(&self.values, &other.values, DEDUP_TOLERANCE)
    }
}

/// A duplicate-free, insertion-ordered set of alpha-vectors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VectorSet {
    vectors: Vec<ValueVector>,
}

impl VectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vectors: Vec::with_capacity(capacity),
        }
    }

    /// Insert a vector unless a componentwise-equal one is already present.
    /// Returns whether the vector was inserted.
    pub fn push(&mut self, vector: ValueVector) -> bool {
        if self.vectors.iter().any(|v| v.approx_eq(&vector)) {
            return false;
        }
        self.vectors.push(vector);
        true
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValueVector> {
        self.vectors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueVector> {
        self.vectors.iter()
    }

    pub fn vectors(&self) -> &[ValueVector] {
        &self.vectors
    }

    /// Best vector at a belief point: index and value, first-seen tie-break.
    pub fn max_value_at(&self, belief: &Belief) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in self.vectors.iter().enumerate() {
            let value = v.value_at(belief);
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((i, value)),
            }
        }
        best
    }

    /// Order-insensitive set equality under [`DEDUP_TOLERANCE`].
    pub fn same_vectors(&self, other: &VectorSet) -> bool {
        self.len() == other.len()
            && self
                .vectors
                .iter()
                .all(|v| other.vectors.iter().any(|w| v.approx_eq(w)))
    }

    /// Symmetric max-min L∞ distance between two sets.
    ///
    /// For each vector, the distance to its nearest counterpart in the other
    /// set; the maximum over both directions. Zero iff the sets are equal up
    /// to reordering; used as the Bellman residual between successive value
    /// functions.
    pub fn set_distance(&self, other: &VectorSet) -> f64 {
        let one_way = |from: &VectorSet, to: &VectorSet| -> f64 {
            from.vectors
                .iter()
                .map(|v| {
                    to.vectors
                        .iter()
                        .map(|w| linf_distance(&v.values, &w.values))
                        .fold(f64::INFINITY, f64::min)
                })
                .fold(0.0, f64::max)
        };
        one_way(self, other).max(one_way(other, self))
    }
}

impl FromIterator<ValueVector> for VectorSet {
    fn from_iter<I: IntoIterator<Item = ValueVector>>(iter: I) -> Self {
        let mut set = VectorSet::new();
        for v in iter {
            set.push(v);
        }
        set
    }
}
