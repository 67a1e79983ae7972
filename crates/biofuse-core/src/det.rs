//! Detection-error-tradeoff computation over raw verification scores.
//!
//! Validates fused output by reporting the operating point at each
//! requested false-match rate: the decision threshold, the empirical FMR
//! actually achieved at that threshold, and the FNMR paid for it.
//!
//! The threshold for a target FMR `f` is the empirical f-quantile taken
//! from the top of the impostor-score distribution: the `ceil(f * n)`-th
//! highest impostor score. With `f = 0` no impostor may match, so the
//! threshold is positive infinity. Tied impostor scores can push the
//! reported FMR above the target; the reported value is always the
//! achieved rate, not the requested one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::status::{FusionError, Result};

/// One DET operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetPoint {
    /// The requested false-match rate.
    pub target_fmr: f64,
    /// Decision threshold achieving the target. NaN when there are no
    /// impostor samples to take a quantile from.
    pub threshold: f64,
    /// Achieved false-match rate at the threshold; NaN without impostors.
    pub fmr: f64,
    /// False-non-match rate at the threshold; NaN without genuine samples.
    pub fnmr: f64,
}

/// Compute DET operating points for a sequence of target FMRs.
///
/// `genuine_mask[i]` tells whether `scores[i]` came from a genuine
/// comparison; the two slices must be parallel. Output order matches the
/// order of `targets`.
///
/// Degenerate inputs (no genuine or no impostor samples) yield NaN for
/// the rates that are undefined, never a division fault.
///
/// # Errors
///
/// - `NonCongruentVectors` when the mask length differs from the scores
/// - `Parse` when a score is not finite or a target is outside `[0, 1]`
pub fn compute_det(
    scores: &[f64],
    genuine_mask: &[bool],
    targets: &[f64],
) -> Result<Vec<DetPoint>> {
    if scores.len() != genuine_mask.len() {
        return Err(FusionError::NonCongruentVectors {
            left: scores.len(),
            right: genuine_mask.len(),
        });
    }
    if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
        return Err(FusionError::parse(
            "input scores",
            format!("score {bad} is not finite"),
        ));
    }
    for &target in targets {
        if !(0.0..=1.0).contains(&target) {
            return Err(FusionError::parse(
                "target FMR list",
                format!("target {target} is outside [0, 1]"),
            ));
        }
    }

    let mut genuine: Vec<f64> = Vec::new();
    let mut impostor: Vec<f64> = Vec::new();
    for (&score, &is_genuine) in scores.iter().zip(genuine_mask) {
        if is_genuine {
            genuine.push(score);
        } else {
            impostor.push(score);
        }
    }
    // Highest impostor scores first; finiteness was checked above so
    // total ordering is safe.
    impostor.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let points = targets
        .iter()
        .map(|&target| operating_point(target, &genuine, &impostor))
        .collect();
    Ok(points)
}

fn operating_point(target: f64, genuine: &[f64], impostor: &[f64]) -> DetPoint {
    if impostor.is_empty() {
        // No impostor distribution to quantile; every rate involving it is
        // undefined, and without a threshold the FNMR is undefined too.
        return DetPoint {
            target_fmr: target,
            threshold: f64::NAN,
            fmr: f64::NAN,
            fnmr: f64::NAN,
        };
    }

    let n = impostor.len();
    let k = (target * n as f64).ceil() as usize;
    let threshold = if k == 0 {
        f64::INFINITY
    } else {
        impostor[k.min(n) - 1]
    };

    let false_matches = impostor.iter().filter(|&&s| s >= threshold).count();
    let fmr = false_matches as f64 / n as f64;

    let fnmr = if genuine.is_empty() {
        f64::NAN
    } else {
        let false_non_matches = genuine.iter().filter(|&&s| s < threshold).count();
        false_non_matches as f64 / genuine.len() as f64
    };

    DetPoint {
        target_fmr: target,
        threshold,
        fmr,
        fnmr,
    }
}
