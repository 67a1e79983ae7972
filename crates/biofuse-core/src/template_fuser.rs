//! Template-level fusion, one-to-one verification, and gallery search.
//!
//! A [`TemplateFuser`] owns a loaded [`FusionModel`] and, once
//! [`TemplateFuser::create_gallery`] has run, an immutable [`Gallery`].
//! The gallery field is written exactly once and read-only afterward,
//! which is what makes concurrent `search` calls on a shared reference
//! safe without external synchronization.

use std::path::Path;

use tracing::debug;

use serde::{Deserialize, Serialize};

use crate::calibration::FusionModel;
use crate::gallery::Gallery;
use crate::status::{FusionError, Result};
use crate::types::{ensure_finite, is_failed_extraction, CandidateList, Score, Template};

/// Which capability [`TemplateFuser::initialize`] should prepare.
///
/// All three actions share one model directory; `Identify` is `Verify`
/// plus gallery construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Template fusion.
    Fuse,
    /// One-to-one comparison of fused templates.
    Verify,
    /// Gallery construction and one-to-many search.
    Identify,
}

/// Strategy for combining K templates into one.
///
/// The dimensionality of fused output is fixed once a scheme is loaded:
/// the sum of input dimensionalities for concatenation, the shared input
/// dimensionality for the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStrategy {
    /// Reference strategy: concatenate in algorithm order, preserving each
    /// algorithm's internal feature ordering.
    #[default]
    Concatenate,
    /// Element-wise weighted sum; all inputs must share one dimensionality.
    WeightedSum,
}

/// Fuses feature templates and compares or searches the fused results.
pub struct TemplateFuser {
    model: FusionModel,
    action: Action,
    gallery: Option<Gallery>,
}

impl TemplateFuser {
    /// Load the fusion scheme from a model directory for the given action.
    ///
    /// # Errors
    ///
    /// `Config` when the directory is unreadable or absent, `Parse` when
    /// the model file is malformed.
    pub fn initialize(directory: impl AsRef<Path>, action: Action) -> Result<Self> {
        let model = FusionModel::load(directory)?;
        debug!(?action, strategy = ?model.template_strategy, "template fuser initialized");
        Ok(Self {
            model,
            action,
            gallery: None,
        })
    }

    /// The loaded calibration model.
    pub fn model(&self) -> &FusionModel {
        &self.model
    }

    /// The action this fuser was initialized for.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The gallery, once built.
    pub fn gallery(&self) -> Option<&Gallery> {
        self.gallery.as_ref()
    }

    /// Fuse K templates, one per algorithm in algorithm order, into one.
    ///
    /// # Errors
    ///
    /// - `NumData` when the input count differs from the calibrated K
    /// - `TemplateCreation` when every input is a failed-extraction marker
    ///   (elective refusal: there is nothing to fuse)
    /// - `VerifTemplate` when some but not all inputs are failed
    ///   extractions
    /// - `TemplateFormat` when an input carries non-finite features
    /// - `NonCongruentVectors` when the weighted-sum strategy is loaded
    ///   and the inputs disagree in dimensionality
    pub fn fuse_templates(&self, inputs: &[Template]) -> Result<Template> {
        if inputs.len() != self.model.k() {
            return Err(FusionError::NumData {
                expected: self.model.k(),
                actual: inputs.len(),
            });
        }

        let failed = inputs.iter().filter(|t| is_failed_extraction(t)).count();
        if failed == inputs.len() {
            return Err(FusionError::TemplateCreation(
                "no input carries usable features".to_string(),
            ));
        }
        if failed > 0 {
            return Err(FusionError::VerifTemplate(format!(
                "{failed} of {} input templates are failed-extraction markers",
                inputs.len()
            )));
        }
        for input in inputs {
            ensure_finite(input)?;
        }

        match self.model.template_strategy {
            TemplateStrategy::Concatenate => {
                let total: usize = inputs.iter().map(Vec::len).sum();
                let mut fused = Vec::with_capacity(total);
                for input in inputs {
                    fused.extend_from_slice(input);
                }
                Ok(fused)
            }
            TemplateStrategy::WeightedSum => {
                let dimension = inputs[0].len();
                for input in &inputs[1..] {
                    if input.len() != dimension {
                        return Err(FusionError::NonCongruentVectors {
                            left: dimension,
                            right: input.len(),
                        });
                    }
                }
                let mut fused = vec![0.0; dimension];
                for (alg, input) in self.model.algorithms.iter().zip(inputs) {
                    for (acc, &feature) in fused.iter_mut().zip(input) {
                        *acc += alg.weight * feature;
                    }
                }
                Ok(fused)
            }
        }
    }

    /// Compare an authentication template against an enrollment template
    /// with the scheme comparator and return a similarity score.
    ///
    /// Symmetric in its two arguments. Under the reference comparator the
    /// score is `100 / (1 + L1)`, so identical templates score exactly
    /// 100.
    pub fn verify(&self, enroll: &Template, authentication: &Template) -> Result<Score> {
        self.model.comparator.similarity(enroll, authentication)
    }

    /// Build the gallery from parallel template and identity vectors.
    ///
    /// The gallery is created exactly once per instance; it becomes
    /// immutable on success and `search` becomes callable.
    ///
    /// # Errors
    ///
    /// - `Vendor` when the instance was not initialized with
    ///   [`Action::Identify`], or the gallery already exists
    /// - plus everything [`Gallery::build`] returns
    pub fn create_gallery(&mut self, templates: Vec<Template>, ids: Vec<u32>) -> Result<()> {
        if self.action != Action::Identify {
            return Err(FusionError::Vendor(format!(
                "create_gallery requires Identify initialization, instance has {:?}",
                self.action
            )));
        }
        if self.gallery.is_some() {
            return Err(FusionError::Vendor(
                "gallery already created; re-initialize for a new gallery".to_string(),
            ));
        }
        self.gallery = Some(Gallery::build(templates, ids)?);
        Ok(())
    }

    /// Search a probe against the gallery, returning up to `list_size`
    /// candidates in descending similarity order.
    ///
    /// Requires a built gallery. Returns all N entries when N is smaller
    /// than `list_size`.
    pub fn search(&self, probe: &Template, list_size: usize) -> Result<CandidateList> {
        let gallery = self.gallery.as_ref().ok_or_else(|| {
            FusionError::Vendor("search called before create_gallery".to_string())
        })?;
        gallery.search(probe, self.model.comparator, list_size)
    }

    /// Search many probes in parallel against the immutable gallery.
    pub fn search_batch(
        &self,
        probes: &[Template],
        list_size: usize,
    ) -> Result<Vec<Result<CandidateList>>> {
        let gallery = self.gallery.as_ref().ok_or_else(|| {
            FusionError::Vendor("search called before create_gallery".to_string())
        })?;
        Ok(gallery.search_batch(probes, self.model.comparator, list_size))
    }
}
