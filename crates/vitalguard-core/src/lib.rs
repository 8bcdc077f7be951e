//! # VitalGuard Core
//!
//! Deterministic building blocks for patient deterioration monitoring:
//! vitals validation, windowed feature extraction, and risk scoring.
//!
//! This crate is pure and synchronous. Everything here is a function of its
//! inputs: the same vitals stream always produces the same assessments.
//! Stateful concerns (alert lifecycle, per-patient workers, persistence)
//! live in `vitalguard-engine`.
//!
//! ## Pipeline
//!
//! ```text
//! RawVitalSample ──validate──▶ VitalSample ──ingest──▶ FeatureSnapshot
//!                                                          │
//!                                  EwsCalculator ◀─────────┤
//!                                       │                  │
//!                                       ▼                  ▼
//!                                  EwsBreakdown ──▶ RiskEnsemble ──▶ RiskAssessment
//! ```
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use vitalguard_core::{
//!     FeatureExtractor, EwsCalculator, RiskEnsemble,
//!     SampleValidator, RawVitalSample,
//! };
//!
//! let validator = SampleValidator::default();
//! let mut extractor = FeatureExtractor::default();
//! let ews = EwsCalculator::default();
//! let ensemble = RiskEnsemble::default();
//!
//! let raw = RawVitalSample {
//!     patient_id: Some("P-001".into()),
//!     timestamp: Some(Utc::now()),
//!     heart_rate: Some(118.0),
//!     spo2: Some(93.0),
//!     ..Default::default()
//! };
//!
//! let sample = validator.validate(raw).expect("physiologically plausible");
//! let snapshot = extractor.ingest(sample);
//! let breakdown = ews.score(&snapshot);
//! let assessment = ensemble.assess(&breakdown, None, &snapshot);
//! assert!(assessment.risk_score >= 0.0 && assessment.risk_score <= 1.0);
//! ```

#![warn(missing_docs)]

pub mod domain;
pub mod error;
pub mod features;
pub mod scoring;
pub mod validate;

pub use domain::{
    ContributingFactor, PatientId, RawVitalSample, RiskAssessment, VitalKind, VitalSample,
};
pub use error::{ModelUnavailable, ValidationError};
pub use features::{
    FeatureExtractor, FeatureSnapshot, FeatureWindow, HorizonFeatures, VitalAggregate,
    WindowConfig,
};
pub use scoring::{
    qsofa_risk, EnsembleConfig, EwsBreakdown, EwsCalculator, ModelOutput, ModelProbability,
    RiskEnsemble, ThresholdTable, Tier, THRESHOLDS_VERSION,
};
pub use validate::{PhysiologicalBounds, SampleValidator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
