//! Pluggable fusion of multiple independent biometric recognition
//! algorithms.
//!
//! Combines the outputs of K >= 2 recognition algorithms at two levels:
//! verification scores are fused into one calibrated score, and feature
//! templates are fused into one template that supports 1:1 verification
//! and ranked 1:N gallery search. Ranked candidate lists from independent
//! searches can themselves be fused, and a DET evaluator reports accuracy
//! operating points over accumulated scores.
//!
//! # Architecture
//!
//! - [`calibration`]: the [`FusionModel`] loaded once from a model
//!   directory and owned by each fuser
//! - [`score_fuser`] / [`template_fuser`]: the two capability objects,
//!   constructed by their `initialize` functions
//! - [`gallery`]: the immutable enrolled gallery and its search engine
//! - [`candidates`]: outer-join fusion of ranked candidate lists
//! - [`det`]: detection-error-tradeoff computation
//! - [`status`]: the status-code contract every operation reports through
//!
//! The numeric strategies shipped here (z-normalized score sums, template
//! concatenation, the L1 comparator, product combination) are reference
//! strategies selected by the model file; swapping one never touches any
//! other component.
//!
//! # Example
//!
//! ```no_run
//! use biofuse_core::{FuserType, ScoreFuser};
//!
//! # fn main() -> biofuse_core::Result<()> {
//! let fuser = ScoreFuser::initialize("model_dir", FuserType::Verification)?;
//! let fused = fuser.fuse_verification_scores(&[3.5, 51.0])?;
//! assert!(fused.is_finite());
//! # Ok(())
//! # }
//! ```

pub mod calibration;
pub mod candidates;
pub mod comparator;
pub mod det;
pub mod gallery;
pub mod score_fuser;
pub mod status;
pub mod template_fuser;
pub mod types;

// Re-exports for convenience
pub use calibration::{AlgorithmCalibration, FusionModel, Observation};
pub use candidates::{fuse_candidate_lists, CombinerStrategy};
pub use comparator::Comparator;
pub use det::{compute_det, DetPoint};
pub use gallery::Gallery;
pub use score_fuser::{FuserType, ScoreFuser};
pub use status::{FusionError, Result, Status, StatusCode};
pub use template_fuser::{Action, TemplateFuser, TemplateStrategy};
pub use types::{Candidate, CandidateList, Score, ScoreSet, Template};
