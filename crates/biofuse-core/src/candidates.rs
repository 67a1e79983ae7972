//! Fusion of ranked identification candidate lists.
//!
//! Given K ranked lists of (identity, score) hypotheses, one per algorithm,
//! this module joins them into a single ranked list. The join is an outer
//! join keyed by identity: an identity absent from a given list contributes
//! an explicit neutral score instead of being dropped. Both the per-list
//! combiner and the neutral score are policy, not law; they materially
//! change ranking and are therefore configurable through the fusion model
//! rather than hard-coded.
//!
//! For K = 2 equal-length inputs of length L the output length lies in
//! `[L, 2L]`: L when the identity sets coincide, 2L when they are disjoint.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::status::{FusionError, Result};
use crate::types::{Candidate, CandidateList};

/// How per-list scores for one identity are combined into a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinerStrategy {
    /// Reference combiner: product of per-list scores.
    #[default]
    Product,
    /// Sum of per-list scores.
    Sum,
    /// Maximum of per-list scores.
    Max,
}

impl CombinerStrategy {
    /// Fold one per-list score into the running combination.
    #[inline]
    pub fn combine(self, acc: f64, score: f64) -> f64 {
        match self {
            Self::Product => acc * score,
            Self::Sum => acc + score,
            Self::Max => acc.max(score),
        }
    }

    /// Identity element of the combiner, used as the starting accumulator.
    #[inline]
    pub fn identity_element(self) -> f64 {
        match self {
            Self::Product => 1.0,
            Self::Sum => 0.0,
            Self::Max => f64::NEG_INFINITY,
        }
    }

    /// Default neutral score assigned to an identity absent from a list,
    /// when the model does not override it. For the product combiner the
    /// reference policy is a neutral multiplier of 1.
    #[inline]
    pub fn default_neutral(self) -> f64 {
        self.identity_element()
    }
}

/// Fuse K ranked candidate lists into one, sorted by score descending.
///
/// Identities are joined across lists; an identity missing from a list
/// contributes `neutral`. Ties and the relative order of equal scores
/// follow first appearance across the input lists, so the output is
/// deterministic for a given input.
///
/// # Errors
///
/// - `NumData` when fewer than two lists are supplied
/// - `NonCongruentVectors` when the lists have different lengths
/// - `Parse` when a list repeats an identity or carries a non-finite score
pub fn fuse_candidate_lists(
    lists: &[CandidateList],
    combiner: CombinerStrategy,
    neutral: f64,
) -> Result<CandidateList> {
    if lists.len() < 2 {
        return Err(FusionError::NumData {
            expected: 2,
            actual: lists.len(),
        });
    }
    let length = lists[0].len();
    for list in &lists[1..] {
        if list.len() != length {
            return Err(FusionError::NonCongruentVectors {
                left: length,
                right: list.len(),
            });
        }
    }

    // Outer join: per identity, the score it got from each list (None when
    // absent). Identity order is first appearance, kept for stable output.
    let mut order: Vec<u32> = Vec::new();
    let mut joined: HashMap<u32, Vec<Option<f64>>> = HashMap::new();
    for (list_idx, list) in lists.iter().enumerate() {
        for candidate in list {
            if !candidate.score.is_finite() {
                return Err(FusionError::parse(
                    format!("candidate list {list_idx}"),
                    format!(
                        "identity {} has a non-finite score",
                        candidate.identity
                    ),
                ));
            }
            let row = joined
                .entry(candidate.identity)
                .or_insert_with(|| vec![None; lists.len()]);
            if row[list_idx].is_some() {
                return Err(FusionError::parse(
                    format!("candidate list {list_idx}"),
                    format!("identity {} appears more than once", candidate.identity),
                ));
            }
            if row.iter().all(Option::is_none) {
                order.push(candidate.identity);
            }
            row[list_idx] = Some(candidate.score);
        }
    }

    let mut fused: CandidateList = order
        .iter()
        .map(|&identity| {
            let row = &joined[&identity];
            let score = row
                .iter()
                .map(|s| s.unwrap_or(neutral))
                .fold(combiner.identity_element(), |acc, s| {
                    combiner.combine(acc, s)
                });
            Candidate::new(identity, score)
        })
        .collect();

    // Descending by score; equal scores keep first-appearance order
    // (stable sort). Inputs are finite, but a combined score can still
    // overflow into NaN (e.g. inf * 0.0 under the product combiner), so
    // NaN orders last, consistently: NaN-vs-NaN compares equal.
    fused.sort_by(|a, b| match b.score.partial_cmp(&a.score) {
        Some(ordering) => ordering,
        None => match (a.score.is_nan(), b.score.is_nan()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Ordering::Equal,
        },
    });

    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(pairs: &[(u32, f64)]) -> CandidateList {
        pairs.iter().map(|&(id, s)| Candidate::new(id, s)).collect()
    }

    #[test]
    fn identical_lists_square_scores_under_product() {
        let a = list(&[(1, 0.9), (2, 0.5), (3, 0.2)]);
        let fused = fuse_candidate_lists(
            &[a.clone(), a.clone()],
            CombinerStrategy::Product,
            1.0,
        )
        .unwrap();

        assert_eq!(fused.len(), 3);
        for (fused_c, orig) in fused.iter().zip(&a) {
            assert_eq!(fused_c.identity, orig.identity);
            assert!((fused_c.score - orig.score * orig.score).abs() < 1e-12);
        }
    }

    #[test]
    fn disjoint_lists_yield_2l_with_neutral_fill() {
        let a = list(&[(1, 0.9), (2, 0.8)]);
        let b = list(&[(10, 0.7), (11, 0.6)]);
        let fused =
            fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).unwrap();

        assert_eq!(fused.len(), 4);
        // Each one-sided entry is its own score times the neutral multiplier.
        let top = &fused[0];
        assert_eq!(top.identity, 1);
        assert!((top.score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn output_is_sorted_descending() {
        let a = list(&[(1, 0.1), (2, 0.9)]);
        let b = list(&[(2, 0.9), (3, 0.5)]);
        let fused =
            fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).unwrap();
        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(fused[0].identity, 2);
    }

    #[test]
    fn sum_combiner_with_zero_neutral() {
        let a = list(&[(1, 2.0)]);
        let b = list(&[(2, 3.0)]);
        let fused = fuse_candidate_lists(&[a, b], CombinerStrategy::Sum, 0.0).unwrap();
        assert_eq!(fused[0].identity, 2);
        assert_eq!(fused[0].score, 3.0);
        assert_eq!(fused[1].score, 2.0);
    }

    #[test]
    fn max_combiner_picks_best_per_identity() {
        let a = list(&[(1, 2.0), (2, 0.5)]);
        let b = list(&[(1, 1.0), (2, 4.0)]);
        let fused = fuse_candidate_lists(
            &[a, b],
            CombinerStrategy::Max,
            CombinerStrategy::Max.default_neutral(),
        )
        .unwrap();
        assert_eq!(fused[0].identity, 2);
        assert_eq!(fused[0].score, 4.0);
        assert_eq!(fused[1].score, 2.0);
    }

    #[test]
    fn neutral_policy_changes_ranking() {
        // Identity 1 is corroborated by both lists; 2 and 3 are one-sided.
        // A neutral multiplier below 1 penalizes one-sided entries relative
        // to corroborated ones; 1.0 leaves them untouched.
        let a = list(&[(1, 0.7), (2, 0.8)]);
        let b = list(&[(1, 0.7), (3, 0.9)]);

        let lenient =
            fuse_candidate_lists(&[a.clone(), b.clone()], CombinerStrategy::Product, 1.0)
                .unwrap();
        assert_eq!(lenient[0].identity, 3);

        let strict =
            fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 0.5).unwrap();
        assert_eq!(strict[0].identity, 1);
    }

    #[test]
    fn fewer_than_two_lists_is_num_data_error() {
        let a = list(&[(1, 0.9)]);
        let err = fuse_candidate_lists(&[a], CombinerStrategy::Product, 1.0).unwrap_err();
        assert!(matches!(err, FusionError::NumData { .. }));
    }

    #[test]
    fn unequal_list_lengths_are_non_congruent() {
        let a = list(&[(1, 0.9), (2, 0.8)]);
        let b = list(&[(3, 0.7)]);
        let err = fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).unwrap_err();
        assert!(matches!(err, FusionError::NonCongruentVectors { .. }));
    }

    #[test]
    fn non_finite_candidate_score_is_a_parse_error() {
        let a = list(&[(1, f64::NAN)]);
        let b = list(&[(2, 0.7)]);
        let err = fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).unwrap_err();
        assert!(matches!(err, FusionError::Parse { .. }));

        let a = list(&[(1, f64::INFINITY)]);
        let b = list(&[(2, 0.7)]);
        assert!(fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).is_err());
    }

    #[test]
    fn duplicate_identity_within_a_list_is_a_parse_error() {
        let a = list(&[(1, 0.9), (1, 0.8)]);
        let b = list(&[(2, 0.7), (3, 0.6)]);
        let err = fuse_candidate_lists(&[a, b], CombinerStrategy::Product, 1.0).unwrap_err();
        assert!(matches!(err, FusionError::Parse { .. }));
    }
}
