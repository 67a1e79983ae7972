//! Status and error contract for the fusion framework.
//!
//! Every fallible operation in this crate returns [`Result`], whose error
//! side is [`FusionError`]. Each error maps onto exactly one wire-level
//! [`StatusCode`], so a harness that speaks the status-code contract can
//! recover the code via [`FusionError::status_code`] without matching on
//! variants. `Success` is an explicit code, never implied: [`Status`] is the
//! value-object form used when an outcome must be reported as data.
//!
//! # Classification
//!
//! - Configuration and model errors (`Config`, `Parse`, `TemplateFormat`)
//!   are fatal for the instance that produced them; no further fuse, verify
//!   or search calls are meaningful until re-initialization.
//! - Input-shape errors (`NumData`, `NonCongruentVectors`) are recoverable:
//!   the caller may retry with corrected input.
//! - `TemplateCreation` is an elective refusal to fuse, a legitimate
//!   business outcome rather than a bug, and is distinguishable from hard
//!   failures via [`FusionError::is_refusal`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// STATUS CODES
// ============================================================================

/// Wire-level status code for every framework operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// Operation completed without error.
    Success,
    /// Model directory unreadable or absent.
    ConfigError,
    /// Model or input data present but malformed.
    ParseError,
    /// Elective refusal to produce a fused template.
    TemplateCreationError,
    /// An input template is a failed-extraction marker.
    VerifTemplateError,
    /// Wrong count of inputs versus the calibrated K.
    NumDataError,
    /// Template has the wrong shape or defective contents.
    TemplateFormatError,
    /// Referenced input data cannot be located.
    InputLocationError,
    /// Memory allocation failed.
    MemoryError,
    /// Mismatched-length vectors passed where equal lengths are required.
    NonCongruentVectors,
    /// Function is not implemented.
    NotImplemented,
    /// Implementation-defined failure.
    VendorError,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "Success",
            Self::ConfigError => "Error reading configuration files",
            Self::ParseError => "Cannot parse the input data",
            Self::TemplateCreationError => "Elective refusal to produce a template",
            Self::VerifTemplateError => "Input template was result of failed feature extraction",
            Self::NumDataError => "Number of input data not supported",
            Self::TemplateFormatError => "Template is an incorrect format or defective",
            Self::InputLocationError => "Cannot locate the input data",
            Self::MemoryError => "Memory allocation failed",
            Self::NonCongruentVectors => "Vectors of different lengths passed to function expecting same lengths",
            Self::NotImplemented => "Function is not implemented",
            Self::VendorError => "Vendor-defined error",
        };
        f.write_str(text)
    }
}

// ============================================================================
// FUSION ERROR
// ============================================================================

/// Unified error type for all fusion framework operations.
///
/// Variants carry enough context to diagnose the failure; the wire-level
/// code is recovered with [`FusionError::status_code`].
#[derive(Debug, Error)]
pub enum FusionError {
    /// Model directory or configuration file unreadable or absent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Data was located but could not be parsed.
    #[error("parse error in {source_name}: {reason}")]
    Parse {
        /// File or input being parsed.
        source_name: String,
        /// Parse failure reason.
        reason: String,
    },

    /// Elective refusal to produce a fused template, e.g. no usable
    /// features among the inputs.
    #[error("declined to create fused template: {0}")]
    TemplateCreation(String),

    /// An input template is itself a failed-extraction marker.
    #[error("failed-extraction template: {0}")]
    VerifTemplate(String),

    /// Wrong number of inputs versus the K the model was calibrated for.
    #[error("expected {expected} inputs, got {actual}")]
    NumData {
        /// Calibrated input count.
        expected: usize,
        /// Actual input count.
        actual: usize,
    },

    /// Template shape or contents are defective (e.g. non-finite features).
    #[error("template format error: {0}")]
    TemplateFormat(String),

    /// Referenced input data cannot be located.
    #[error("cannot locate input data: {0}")]
    InputLocation(String),

    /// Allocation failure while building internal structures.
    #[error("memory allocation failed: {0}")]
    Memory(String),

    /// Mismatched-length vectors where equal lengths are required.
    #[error("non-congruent vectors: lengths {left} and {right}")]
    NonCongruentVectors {
        /// Length of the first vector.
        left: usize,
        /// Length of the second vector.
        right: usize,
    },

    /// Requested capability is not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Implementation-defined failure, including state-machine violations
    /// such as searching before the gallery has been created.
    #[error("vendor error: {0}")]
    Vendor(String),
}

impl FusionError {
    /// Wire-level status code for this error.
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::ConfigError,
            Self::Parse { .. } => StatusCode::ParseError,
            Self::TemplateCreation(_) => StatusCode::TemplateCreationError,
            Self::VerifTemplate(_) => StatusCode::VerifTemplateError,
            Self::NumData { .. } => StatusCode::NumDataError,
            Self::TemplateFormat(_) => StatusCode::TemplateFormatError,
            Self::InputLocation(_) => StatusCode::InputLocationError,
            Self::Memory(_) => StatusCode::MemoryError,
            Self::NonCongruentVectors { .. } => StatusCode::NonCongruentVectors,
            Self::NotImplemented(_) => StatusCode::NotImplemented,
            Self::Vendor(_) => StatusCode::VendorError,
        }
    }

    /// True when the caller may retry the same operation with corrected
    /// input on the same instance.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NumData { .. } | Self::NonCongruentVectors { .. } | Self::VerifTemplate(_)
        )
    }

    /// True when the error invalidates the instance; only re-initialization
    /// helps.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Parse { .. } | Self::TemplateFormat(_) | Self::Memory(_)
        )
    }

    /// True for elective refusals, which are business outcomes rather than
    /// failures.
    #[inline]
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::TemplateCreation(_))
    }

    /// Convenience constructor for parse errors.
    pub fn parse(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for fusion framework operations.
pub type Result<T> = std::result::Result<T, FusionError>;

// ============================================================================
// STATUS VALUE OBJECT
// ============================================================================

/// Outcome of one operation as data: a code plus an optional message.
///
/// Created fresh per call when an outcome must cross a reporting boundary
/// (e.g. the CLI printing per-row results).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status code; `Success` is explicit.
    pub code: StatusCode,
    /// Optional diagnostic message, empty on success.
    #[serde(default)]
    pub info: String,
}

impl Status {
    /// Successful status with no message.
    pub fn success() -> Self {
        Self {
            code: StatusCode::Success,
            info: String::new(),
        }
    }

    /// Build a status from an operation outcome.
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::success(),
            Err(e) => Self {
                code: e.status_code(),
                info: e.to_string(),
            },
        }
    }

    /// True when the code is `Success`.
    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }
}
