//! Verification-score and candidate-list fusion.
//!
//! A [`ScoreFuser`] owns a loaded [`FusionModel`] for its lifetime. The
//! reference scripts built fusion behavior as closures capturing loaded
//! calibration state; here that is an explicit stateful value constructed
//! by [`ScoreFuser::initialize`]. Re-initialization means constructing a
//! fresh instance, never mutating an existing one.

use std::path::Path;

use tracing::debug;

use crate::calibration::FusionModel;
use crate::candidates;
use crate::status::{FusionError, Result};
use crate::types::{CandidateList, Score};

/// Which fusion scheme the score fuser should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuserType {
    /// Verification-score fusion (1:1 comparisons).
    Verification,
    /// Identification candidate-list fusion (1:N searches).
    Identification,
}

/// Fuses K per-algorithm verification scores, or K ranked candidate lists,
/// into one.
pub struct ScoreFuser {
    model: FusionModel,
    fuser_type: FuserType,
}

impl ScoreFuser {
    /// Load the fusion scheme from a model directory.
    ///
    /// # Errors
    ///
    /// `Config` when the directory is unreadable or absent, `Parse` when
    /// the model file is malformed. Both are fatal: nothing useful can be
    /// done with a fuser that failed to initialize, which is why this is a
    /// constructor rather than a mutating call.
    pub fn initialize(directory: impl AsRef<Path>, fuser_type: FuserType) -> Result<Self> {
        let model = FusionModel::load(directory)?;
        debug!(?fuser_type, k = model.k(), "score fuser initialized");
        Ok(Self { model, fuser_type })
    }

    /// The loaded calibration model.
    pub fn model(&self) -> &FusionModel {
        &self.model
    }

    /// The scheme this fuser was initialized for.
    pub fn fuser_type(&self) -> FuserType {
        self.fuser_type
    }

    /// Number of per-algorithm inputs every fuse call must supply.
    pub fn expected_inputs(&self) -> usize {
        self.model.k()
    }

    /// Fuse K per-algorithm verification scores into one.
    ///
    /// Reference strategy: z-normalize each score against its algorithm's
    /// impostor cohort, `(score - position) / scale`, and take the
    /// weighted sum (all weights default to 1, giving the equal-weight
    /// sum of z-scores). Pure and deterministic: identical input against
    /// an identical model yields a bit-identical result. The output is
    /// unbounded; only "higher is more similar" is guaranteed.
    ///
    /// # Errors
    ///
    /// - `NumData` when `scores.len()` differs from the calibrated K
    /// - `Parse` when a score is NaN or infinite
    pub fn fuse_verification_scores(&self, scores: &[Score]) -> Result<Score> {
        if scores.len() != self.model.k() {
            return Err(FusionError::NumData {
                expected: self.model.k(),
                actual: scores.len(),
            });
        }
        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(FusionError::parse(
                "input scores",
                format!("score {bad} is not finite"),
            ));
        }

        let fused = self
            .model
            .algorithms
            .iter()
            .zip(scores)
            .map(|(alg, &score)| alg.weight * alg.normalize(score))
            .sum();
        Ok(fused)
    }

    /// Fuse K ranked candidate lists into one, sorted by score descending.
    ///
    /// The combiner and the neutral score for absent identities come from
    /// the loaded model; see [`crate::candidates`] for the join semantics.
    ///
    /// # Errors
    ///
    /// `NumData` when the number of lists differs from the calibrated K,
    /// plus the validation errors of [`candidates::fuse_candidate_lists`].
    pub fn fuse_candidate_lists(&self, lists: &[CandidateList]) -> Result<CandidateList> {
        if lists.len() != self.model.k() {
            return Err(FusionError::NumData {
                expected: self.model.k(),
                actual: lists.len(),
            });
        }
        candidates::fuse_candidate_lists(lists, self.model.combiner, self.model.neutral_score())
    }
}
