//! Error types for the core scoring pipeline.
//!
//! Every condition here is recoverable: a failed validation drops one
//! sample, an unavailable model falls back to clinical-only scoring.
//! Nothing in this crate panics on malformed input.

use thiserror::Error;

/// A sample failed validation and must be dropped.
///
/// Validation rejects only physiologically impossible or corrupt data.
/// Abnormal-but-possible readings (tachycardia, hypoxia) pass through and
/// are scored downstream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The sample carried no patient identifier.
    #[error("sample has no patient id")]
    MissingPatientId,

    /// The sample carried no timestamp.
    #[error("sample has no timestamp")]
    MissingTimestamp,

    /// A vital reading is outside its hard physiological bound.
    #[error("{vital} reading {value} outside physiological range [{min}, {max}]")]
    OutOfRange {
        /// Which vital was rejected.
        vital: &'static str,
        /// The offending value.
        value: f64,
        /// Lower hard bound (inclusive).
        min: f64,
        /// Upper hard bound (inclusive).
        max: f64,
    },

    /// A vital reading is NaN or infinite.
    #[error("{vital} reading is not a finite number")]
    NotFinite {
        /// Which vital was rejected.
        vital: &'static str,
    },
}

/// The pluggable probability model could not produce an output.
///
/// The ensemble treats this as a degraded-confidence condition, never as a
/// pipeline failure.
#[derive(Debug, Clone, Error)]
#[error("model probability unavailable: {reason}")]
pub struct ModelUnavailable {
    /// Why the model output is missing (timeout, cold model, transport).
    pub reason: String,
}

impl ModelUnavailable {
    /// Create a new unavailability marker.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
