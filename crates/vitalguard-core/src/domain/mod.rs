//! Domain types shared across the scoring pipeline.

pub mod assessment;
pub mod sample;

pub use assessment::{ContributingFactor, RiskAssessment};
pub use sample::{PatientId, RawVitalSample, VitalKind, VitalSample};
