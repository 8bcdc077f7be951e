//! Clinical scoring: tiered thresholds, EWS, and the risk ensemble.
//!
//! The threshold table lives in exactly one place ([`thresholds`]); every
//! scoring path references it, so the table cannot drift between callers.

pub mod ensemble;
pub mod ews;
pub mod thresholds;

pub use ensemble::{EnsembleConfig, ModelOutput, ModelProbability, RiskEnsemble};
pub use ews::{qsofa_risk, EwsBreakdown, EwsCalculator};
pub use thresholds::{ThresholdTable, Tier, THRESHOLDS_VERSION};
