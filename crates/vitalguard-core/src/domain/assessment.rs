//! Risk assessments produced by the ensemble.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PatientId;

/// One ranked contributor to a risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    /// Stable factor label ("heart_rate", "qsofa", "trend:respiratory_rate",
    /// or a model attribution name).
    pub factor: String,
    /// Relative magnitude in [0, 1]; factors are ordered descending.
    pub magnitude: f64,
}

/// A deterioration risk assessment for one patient at one instant.
///
/// Produced fresh on every ingested sample and never mutated; the alert
/// lifecycle consumes it immediately, the assessment stream republishes it
/// for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Assessed patient.
    pub patient_id: PatientId,
    /// Timestamp of the sample that produced this assessment.
    pub timestamp: DateTime<Utc>,
    /// Discrete clinical early warning score.
    pub ews_score: u32,
    /// Blended continuous risk in [0, 1].
    pub risk_score: f64,
    /// Evidence completeness in [0, 1]; low when vitals or history are thin
    /// or when no model probability was available.
    pub confidence: f64,
    /// Contributors ranked by descending magnitude.
    pub contributing_factors: Vec<ContributingFactor>,
    /// Whether a model probability participated in the blend.
    pub model_used: bool,
    /// Version of the threshold table that produced `ews_score`.
    pub thresholds_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn assessment_serializes_round_trip() {
        let a = RiskAssessment {
            patient_id: "P-1".into(),
            timestamp: Utc::now(),
            ews_score: 7,
            risk_score: 0.58,
            confidence: 0.4,
            contributing_factors: vec![ContributingFactor {
                factor: "spo2".into(),
                magnitude: 1.0,
            }],
            model_used: false,
            thresholds_version: crate::scoring::THRESHOLDS_VERSION.to_string(),
        };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"ews_score\":7"));
        assert!(json.contains("spo2"));
    }
}
