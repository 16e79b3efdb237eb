//! Observation cross-sums.
//!
//! For a fixed action, combining the per-observation projections means
//! picking exactly one vector from each observation's set and summing them
//! componentwise. Done naively over all observations at once the output is
//! multiplicative in every set size; the solver instead folds observations
//! in one at a time, pruning the running sum after each fold, which is what
//! makes incremental pruning scale.

use crate::solver::vector_set::{ValueVector, VectorSet};

/// All pairwise componentwise sums of two sets.
///
/// The action tag is taken from `lhs`; within one action's fold every
/// operand carries the same tag. Output size is `lhs.len() * rhs.len()`
/// before duplicate collapse.
pub fn cross_sum(lhs: &VectorSet, rhs: &VectorSet) -> VectorSet {
    let mut out = VectorSet::with_capacity(lhs.len() * rhs.len());
    for a in lhs.iter() {
        for b in rhs.iter() {
            let values: Vec<f64> = a
                .values()
                .iter()
                .zip(b.values())
                .map(|(&x, &y)| x + y)
                .collect();
            out.push(ValueVector::new(values, a.action()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vv(values: &[f64], action: usize) -> ValueVector {
        ValueVector::new(values.to_vec(), action)
    }

    #[test]
    fn output_size_is_product() {
        let lhs: VectorSet = [vv(&[1.0, 0.0], 0), vv(&[0.0, 1.0], 0)]
            .into_iter()
            .collect();
        let rhs: VectorSet = [
            vv(&[10.0, 0.0], 0),
            vv(&[0.0, 10.0], 0),
            vv(&[5.0, 5.0], 0),
        ]
        .into_iter()
        .collect();
        let out = cross_sum(&lhs, &rhs);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn sums_are_componentwise() {
        let lhs: VectorSet = [vv(&[1.0, 2.0], 1)].into_iter().collect();
        let rhs: VectorSet = [vv(&[10.0, 20.0], 1)].into_iter().collect();
        let out = cross_sum(&lhs, &rhs);
        assert_eq!(out.get(0).unwrap().values(), &[11.0, 22.0]);
    }

    #[test]
    fn action_tag_comes_from_lhs() {
        let lhs: VectorSet = [vv(&[1.0], 2)].into_iter().collect();
        let rhs: VectorSet = [vv(&[1.0], 7)].into_iter().collect();
        let out = cross_sum(&lhs, &rhs);
        assert_eq!(out.get(0).unwrap().action(), 2);
    }

    #[test]
    fn duplicate_sums_collapse() {
        // 1+2 and 2+1 produce the same vector.
        let lhs: VectorSet = [vv(&[1.0], 0), vv(&[2.0], 0)].into_iter().collect();
        let rhs: VectorSet = [vv(&[2.0], 0), vv(&[1.0], 0)].into_iter().collect();
        let out = cross_sum(&lhs, &rhs);
        assert_eq!(out.len(), 3); // 3, 2, 4
    }

    #[test]
    fn empty_operand_gives_empty_output() {
        let lhs: VectorSet = [vv(&[1.0], 0)].into_iter().collect();
        let out = cross_sum(&lhs, &VectorSet::new());
        assert!(out.is_empty());
    }
}
