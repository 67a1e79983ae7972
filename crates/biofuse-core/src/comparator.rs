//! Template comparators for verification and gallery search.
//!
//! A comparator turns two fused templates into one similarity score. The
//! comparator is part of the fusion scheme: it is selected by the model
//! file at initialization and must match the strategy the templates were
//! fused with. Swapping comparators never touches any other component.
//!
//! All comparators are symmetric in their two arguments and deterministic.

use serde::{Deserialize, Serialize};

use crate::status::{FusionError, Result};
use crate::types::{ensure_finite, is_failed_extraction, Score, Template};

/// Similarity comparator over fused templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Reference comparator: `score = 100 / (1 + L1(a, b))`.
    ///
    /// Monotonically decreasing in distance, strictly positive, with the
    /// fixed point `score(0) = 100` for identical templates.
    #[default]
    L1Inverse,
    /// Cosine similarity shifted to `[0, 100]`: `50 * (1 + cos(a, b))`.
    ///
    /// Zero-magnitude inputs compare as orthogonal (score 50), never NaN.
    Cosine,
}

impl Comparator {
    /// Compare two fused templates and return a similarity score.
    ///
    /// # Errors
    ///
    /// - `NonCongruentVectors` when lengths differ
    /// - `VerifTemplate` when either input is a failed-extraction marker
    /// - `TemplateFormat` when either input carries non-finite features
    pub fn similarity(&self, enroll: &Template, authentication: &Template) -> Result<Score> {
        if is_failed_extraction(enroll) || is_failed_extraction(authentication) {
            return Err(FusionError::VerifTemplate(
                "comparison input is a failed-extraction marker".to_string(),
            ));
        }
        if enroll.len() != authentication.len() {
            return Err(FusionError::NonCongruentVectors {
                left: enroll.len(),
                right: authentication.len(),
            });
        }
        ensure_finite(enroll)?;
        ensure_finite(authentication)?;

        let score = match self {
            Self::L1Inverse => {
                let distance: f64 = enroll
                    .iter()
                    .zip(authentication)
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                100.0 / (1.0 + distance)
            }
            Self::Cosine => 50.0 * (1.0 + cosine(enroll, authentication)),
        };
        Ok(score)
    }
}

/// Cosine of the angle between two equal-length vectors, in `[-1, 1]`.
///
/// Returns 0.0 when either vector has zero magnitude, so downstream scores
/// stay finite.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}
