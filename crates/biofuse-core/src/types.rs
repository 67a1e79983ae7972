//! Core value types shared across the fusion framework.

use serde::{Deserialize, Serialize};

use crate::status::{FusionError, Result};

/// Similarity score. Higher means more similar.
pub type Score = f64;

/// K per-algorithm verification scores for one comparison.
pub type ScoreSet = Vec<Score>;

/// Fixed-length feature vector representing one biometric sample.
///
/// An empty template is the failed-extraction marker produced by an
/// upstream recognition algorithm.
pub type Template = Vec<f64>;

/// One identity hypothesis from a 1:N search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Gallery identity label.
    pub identity: u32,
    /// Similarity score from recognition or fusion.
    pub score: Score,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(identity: u32, score: Score) -> Self {
        Self { identity, score }
    }
}

/// Ranked list of identity hypotheses. Fused output is non-increasing by
/// score; identities are unique within one list.
pub type CandidateList = Vec<Candidate>;

/// True when a template is the failed-extraction marker.
#[inline]
pub fn is_failed_extraction(template: &[f64]) -> bool {
    template.is_empty()
}

/// Reject templates carrying NaN or infinite features.
pub fn ensure_finite(template: &[f64]) -> Result<()> {
    if template.iter().any(|v| !v.is_finite()) {
        return Err(FusionError::TemplateFormat(
            "template contains non-finite features".to_string(),
        ));
    }
    Ok(())
}
