//! Calibration model loaded from a developer-supplied model directory.
//!
//! A [`FusionModel`] is the one piece of persistent state in the framework:
//! per-algorithm calibration parameters plus scheme-wide metadata selecting
//! the comparator, template strategy and candidate-list combiner. It is
//! loaded once at initialization and immutable afterward; every fuser owns
//! its model for the lifetime of the instance.
//!
//! # Model directory schema
//!
//! The directory contains a single `fusion.toml`:
//!
//! ```toml
//! schema_version = 1
//! comparator = "l1_inverse"
//! template_strategy = "concatenate"
//! combiner = "product"
//! # neutral_score = 1.0    # optional override of the combiner default
//!
//! [[algorithm]]
//! name = "alpha"
//! position = 3.0
//! scale = 0.2
//! weight = 1.0
//!
//! [[algorithm]]
//! name = "beta"
//! position = 50.0
//! scale = 2.0
//! ```
//!
//! # Cohort calibration
//!
//! [`FusionModel::fit`] reproduces the reference calibration exactly:
//! per algorithm, `position` is the mean and `scale` the standard deviation
//! of the *impostor* scores only (observations where the two identities
//! differ). The genuine population plays no part in calibration.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidates::CombinerStrategy;
use crate::comparator::Comparator;
use crate::status::{FusionError, Result};
use crate::template_fuser::TemplateStrategy;

/// Name of the model file inside the model directory.
pub const MODEL_FILE_NAME: &str = "fusion.toml";

const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_weight() -> f64 {
    1.0
}

// ============================================================================
// PER-ALGORITHM CALIBRATION
// ============================================================================

/// Calibration parameters for one recognition algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmCalibration {
    /// Algorithm name, unique within the model.
    pub name: String,
    /// Impostor-score mean, subtracted during z-normalization.
    pub position: f64,
    /// Impostor-score standard deviation, divided out during
    /// z-normalization. Must be finite and positive.
    pub scale: f64,
    /// Relative weight in fused sums. Defaults to 1.0 (equal weight).
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl AlgorithmCalibration {
    /// Z-normalize a raw score from this algorithm.
    #[inline]
    pub fn normalize(&self, score: f64) -> f64 {
        (score - self.position) / self.scale
    }
}

// ============================================================================
// OBSERVATIONS (calibration input)
// ============================================================================

/// One labeled comparison used for calibration: the identities of the two
/// samples and the K per-algorithm scores the comparison produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Identity of the enrollment sample.
    pub identity_a: u32,
    /// Identity of the authentication sample.
    pub identity_b: u32,
    /// Per-algorithm scores, aligned with the algorithm name order.
    pub scores: Vec<f64>,
}

impl Observation {
    /// True when the two samples come from different identities.
    #[inline]
    pub fn is_impostor(&self) -> bool {
        self.identity_a != self.identity_b
    }
}

// ============================================================================
// FUSION MODEL
// ============================================================================

/// Calibration parameters for a fusion scheme over K algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionModel {
    /// Schema version of the model file.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Comparator used by verify and search.
    #[serde(default)]
    pub comparator: Comparator,
    /// Strategy used by template fusion.
    #[serde(default)]
    pub template_strategy: TemplateStrategy,
    /// Combiner used by candidate-list fusion.
    #[serde(default)]
    pub combiner: CombinerStrategy,
    /// Override for the neutral score assigned to identities absent from a
    /// candidate list. When unset, the combiner's own default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_score: Option<f64>,
    /// Per-algorithm calibration table, in algorithm order.
    #[serde(rename = "algorithm")]
    pub algorithms: Vec<AlgorithmCalibration>,
}

impl FusionModel {
    /// Number of algorithms this scheme was calibrated for.
    #[inline]
    pub fn k(&self) -> usize {
        self.algorithms.len()
    }

    /// Effective neutral score for candidate-list fusion.
    #[inline]
    pub fn neutral_score(&self) -> f64 {
        self.neutral_score
            .unwrap_or_else(|| self.combiner.default_neutral())
    }

    /// Load a model from `directory/fusion.toml`.
    ///
    /// # Errors
    ///
    /// - `Config` when the directory or file is missing or unreadable
    /// - `Parse` when the file exists but is malformed or fails validation
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        let path = directory.as_ref().join(MODEL_FILE_NAME);
        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                FusionError::Config(format!("model file '{}' not found", path.display()))
            }
            _ => FusionError::Config(format!("cannot read '{}': {}", path.display(), e)),
        })?;

        let model: Self = toml::from_str(&contents)
            .map_err(|e| FusionError::parse(path.display().to_string(), e.to_string()))?;
        model.validate()?;

        debug!(
            k = model.k(),
            comparator = ?model.comparator,
            "loaded fusion model"
        );
        Ok(model)
    }

    /// Write the model to `directory/fusion.toml`, creating the directory
    /// if needed.
    pub fn save(&self, directory: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let directory = directory.as_ref();
        fs::create_dir_all(directory).map_err(|e| {
            FusionError::Config(format!(
                "cannot create model directory '{}': {}",
                directory.display(),
                e
            ))
        })?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FusionError::Vendor(format!("cannot serialize model: {e}")))?;
        let path = directory.join(MODEL_FILE_NAME);
        fs::write(&path, contents)
            .map_err(|e| FusionError::Config(format!("cannot write '{}': {}", path.display(), e)))
    }

    /// Fit a model from labeled score observations.
    ///
    /// Cohort calibration: only impostor observations contribute; per
    /// algorithm, `position` is their mean and `scale` their population
    /// standard deviation. Scheme-wide metadata takes the defaults and can
    /// be adjusted on the returned model before saving.
    ///
    /// # Errors
    ///
    /// - `NumData` when an observation's score count disagrees with `names`
    /// - `Config` when there are fewer than two impostor observations, or
    ///   an algorithm's impostor scores have zero variance
    pub fn fit(names: &[String], observations: &[Observation]) -> Result<Self> {
        for obs in observations {
            if obs.scores.len() != names.len() {
                return Err(FusionError::NumData {
                    expected: names.len(),
                    actual: obs.scores.len(),
                });
            }
        }

        let impostors: Vec<&Observation> =
            observations.iter().filter(|o| o.is_impostor()).collect();
        if impostors.len() < 2 {
            return Err(FusionError::Config(format!(
                "calibration needs at least 2 impostor observations, got {}",
                impostors.len()
            )));
        }

        let n = impostors.len() as f64;
        let mut algorithms = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            let mean = impostors.iter().map(|o| o.scores[idx]).sum::<f64>() / n;
            let variance = impostors
                .iter()
                .map(|o| {
                    let d = o.scores[idx] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            let stddev = variance.sqrt();
            if stddev <= 0.0 || !stddev.is_finite() {
                return Err(FusionError::Config(format!(
                    "impostor scores for algorithm '{name}' have no usable spread"
                )));
            }
            algorithms.push(AlgorithmCalibration {
                name: name.clone(),
                position: mean,
                scale: stddev,
                weight: default_weight(),
            });
        }

        let model = Self {
            schema_version: SCHEMA_VERSION,
            comparator: Comparator::default(),
            template_strategy: TemplateStrategy::default(),
            combiner: CombinerStrategy::default(),
            neutral_score: None,
            algorithms,
        };
        model.validate()?;
        Ok(model)
    }

    /// Fit a model from a JSON Lines observation file, one [`Observation`]
    /// per line.
    ///
    /// # Errors
    ///
    /// - `InputLocation` when the file cannot be located
    /// - `Parse` when a line is not a valid observation
    /// - plus everything [`FusionModel::fit`] returns
    pub fn fit_from_file(names: &[String], path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                FusionError::InputLocation(format!("observation file '{}'", path.display()))
            }
            _ => FusionError::Config(format!("cannot read '{}': {}", path.display(), e)),
        })?;

        let mut observations = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let obs: Observation = serde_json::from_str(line).map_err(|e| {
                FusionError::parse(
                    format!("{}:{}", path.display(), line_no + 1),
                    e.to_string(),
                )
            })?;
            observations.push(obs);
        }
        Self::fit(names, &observations)
    }

    /// Check model invariants: K >= 2, unique algorithm names, finite
    /// positions and weights, positive finite scales.
    pub fn validate(&self) -> Result<()> {
        if self.k() < 2 {
            return Err(FusionError::parse(
                MODEL_FILE_NAME,
                format!("fusion requires at least 2 algorithms, model has {}", self.k()),
            ));
        }
        for (idx, alg) in self.algorithms.iter().enumerate() {
            if alg.name.is_empty() {
                return Err(FusionError::parse(
                    MODEL_FILE_NAME,
                    format!("algorithm {idx} has an empty name"),
                ));
            }
            if self.algorithms[..idx].iter().any(|a| a.name == alg.name) {
                return Err(FusionError::parse(
                    MODEL_FILE_NAME,
                    format!("duplicate algorithm name '{}'", alg.name),
                ));
            }
            if !alg.position.is_finite() || !alg.weight.is_finite() {
                return Err(FusionError::parse(
                    MODEL_FILE_NAME,
                    format!("algorithm '{}' has non-finite parameters", alg.name),
                ));
            }
            if !(alg.scale.is_finite() && alg.scale > 0.0) {
                return Err(FusionError::parse(
                    MODEL_FILE_NAME,
                    format!("algorithm '{}' has non-positive scale", alg.name),
                ));
            }
        }
        if let Some(neutral) = self.neutral_score {
            if !neutral.is_finite() {
                return Err(FusionError::parse(
                    MODEL_FILE_NAME,
                    "neutral_score must be finite",
                ));
            }
        }
        Ok(())
    }
}
