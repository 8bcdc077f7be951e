//! Risk ensemble: blends the clinical EWS with an optional learned
//! probability into one continuous risk value.
//!
//! The rule-based score is always available and auditable; the model is
//! opportunistic. When the model is missing the assessment degrades in
//! confidence, never in availability.

use tracing::debug;

use crate::domain::{ContributingFactor, RiskAssessment};
use crate::error::ModelUnavailable;
use crate::features::FeatureSnapshot;

use super::ews::{qsofa_risk, EwsBreakdown};
use super::thresholds::THRESHOLDS_VERSION;

/// Output of the pluggable probability model.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Deterioration probability in [0, 1].
    pub probability: f64,
    /// Optional per-feature attributions (name, magnitude), most important
    /// first as reported by the model.
    pub attributions: Vec<(String, f64)>,
}

/// Pluggable pre-trained scoring capability.
///
/// Implementations must return quickly; a slow or failing model is
/// reported as [`ModelUnavailable`] and the ensemble falls back to
/// clinical-only scoring. The ensemble never blocks waiting on a model.
///
/// This is a synchronous seam called on the scoring path, and the caller
/// applies no deadline of its own. An adapter wrapping a remote or
/// otherwise slow model is responsible for enforcing its own timeout and
/// mapping the overrun to [`ModelUnavailable`].
pub trait ModelProbability: Send + Sync {
    /// Produce a deterioration probability for the given features.
    fn probability(&self, snapshot: &FeatureSnapshot) -> Result<ModelOutput, ModelUnavailable>;
}

/// Configuration for the risk ensemble.
#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    /// Weight of the normalized clinical EWS (default 0.6).
    pub clinical_weight: f64,
    /// Weight of the model probability (default 0.4).
    pub model_weight: f64,
    /// EWS value at which normalized clinical risk saturates at 1.0
    /// (default 12; higher sums do not wrap or error).
    pub ews_cap: u32,
    /// Size of the full expected vital panel (default 6).
    pub expected_vitals: usize,
    /// Window length at which history completeness saturates (default 24).
    pub history_target: usize,
    /// Confidence ceiling when no model probability is available
    /// (default 0.5).
    pub no_model_confidence_cap: f64,
    /// qSOFA risk at or above which sepsis risk is surfaced as a
    /// contributing factor (default 0.8, i.e. two qSOFA points).
    pub qsofa_factor_level: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            clinical_weight: 0.6,
            model_weight: 0.4,
            ews_cap: 12,
            expected_vitals: 6,
            history_target: 24,
            no_model_confidence_cap: 0.5,
            qsofa_factor_level: 0.8,
        }
    }
}

/// Fixed fallback when a snapshot carries zero present vitals: low risk,
/// zero confidence, never a failure.
const EMPTY_SNAPSHOT_RISK: f64 = 0.1;

/// Magnitude assigned to a deterioration trend flag when ranked among
/// contributing factors.
const TREND_FACTOR_MAGNITUDE: f64 = 0.25;

/// Blends clinical and model evidence into a [`RiskAssessment`].
#[derive(Debug, Clone, Default)]
pub struct RiskEnsemble {
    config: EnsembleConfig,
}

impl RiskEnsemble {
    /// Create an ensemble with custom configuration.
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    /// Get configuration.
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Produce a risk assessment from the clinical breakdown, an optional
    /// model output, and the feature snapshot.
    ///
    /// For fixed weights the result is monotonically non-decreasing in the
    /// EWS total.
    pub fn assess(
        &self,
        breakdown: &EwsBreakdown,
        model: Option<ModelOutput>,
        snapshot: &FeatureSnapshot,
    ) -> RiskAssessment {
        // A garbled or empty panel must never crash the pipeline.
        if snapshot.latest.present_count() == 0 {
            debug!(patient_id = %snapshot.patient_id, "empty vital panel, emitting floor assessment");
            return RiskAssessment {
                patient_id: snapshot.patient_id.clone(),
                timestamp: snapshot.timestamp,
                ews_score: 0,
                risk_score: EMPTY_SNAPSHOT_RISK,
                confidence: 0.0,
                contributing_factors: Vec::new(),
                model_used: false,
                thresholds_version: THRESHOLDS_VERSION.to_string(),
            };
        }

        let cap = self.config.ews_cap.max(1);
        let normalized_ews = f64::from(breakdown.total.min(cap)) / f64::from(cap);

        let (risk_score, model_used) = match &model {
            Some(output) => {
                let blended = self.config.clinical_weight * normalized_ews
                    + self.config.model_weight * output.probability;
                (blended.clamp(0.0, 1.0), true)
            }
            None => (normalized_ews, false),
        };

        let mut confidence = self.confidence(snapshot);
        if !model_used {
            confidence = confidence.min(self.config.no_model_confidence_cap);
        }

        RiskAssessment {
            patient_id: snapshot.patient_id.clone(),
            timestamp: snapshot.timestamp,
            ews_score: breakdown.total,
            risk_score,
            confidence,
            contributing_factors: self.rank_factors(breakdown, model.as_ref(), snapshot),
            model_used,
            thresholds_version: THRESHOLDS_VERSION.to_string(),
        }
    }

    /// Evidence completeness: how much of the vital panel is present, and
    /// how much history backs the trends. Ratios, not learned values.
    fn confidence(&self, snapshot: &FeatureSnapshot) -> f64 {
        let expected = self.config.expected_vitals.max(1) as f64;
        let panel = (snapshot.latest.present_count() as f64 / expected).min(1.0);

        let target = self.config.history_target.max(1) as f64;
        let history = (snapshot.window_len as f64 / target).min(1.0);

        0.5 * panel + 0.5 * history
    }

    /// Rank contributors: abnormal vital sub-scores, sepsis screen, trend
    /// flags, then model attributions; descending magnitude with ties
    /// broken by the canonical vital order.
    fn rank_factors(
        &self,
        breakdown: &EwsBreakdown,
        model: Option<&ModelOutput>,
        snapshot: &FeatureSnapshot,
    ) -> Vec<ContributingFactor> {
        // (magnitude, tie-break rank, label)
        let mut ranked: Vec<(f64, usize, String)> = Vec::new();

        for &(kind, points) in &breakdown.per_vital {
            if points > 0 {
                ranked.push((
                    f64::from(points) / 3.0,
                    kind.order_index(),
                    kind.label().to_string(),
                ));
            }
        }

        let qsofa = qsofa_risk(&snapshot.latest);
        if qsofa >= self.config.qsofa_factor_level {
            ranked.push((qsofa, QSOFA_RANK, "qsofa".to_string()));
        }

        for kind in &snapshot.trend_flags {
            ranked.push((
                TREND_FACTOR_MAGNITUDE,
                TREND_RANK_BASE + kind.order_index(),
                format!("trend:{}", kind.label()),
            ));
        }

        if let Some(output) = model {
            for (i, (name, magnitude)) in output.attributions.iter().enumerate() {
                ranked.push((*magnitude, 100 + i, name.clone()));
            }
        }

        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        ranked
            .into_iter()
            .map(|(magnitude, _, factor)| ContributingFactor { factor, magnitude })
            .collect()
    }
}

/// Tie-break rank reserved for the qSOFA factor (just past the vitals).
const QSOFA_RANK: usize = 6;
/// Tie-break rank base for trend flags.
const TREND_RANK_BASE: usize = 7;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VitalSample;
    use crate::features::{FeatureWindow, WindowConfig};
    use crate::scoring::EwsCalculator;
    use chrono::Utc;

    fn snapshot_for(sample: VitalSample) -> FeatureSnapshot {
        FeatureWindow::new(WindowConfig::default()).ingest(sample)
    }

    fn sample() -> VitalSample {
        VitalSample {
            patient_id: "P-1".into(),
            timestamp: Utc::now(),
            heart_rate: Some(72.0),
            bp_systolic: None,
            bp_diastolic: None,
            respiratory_rate: None,
            temperature: None,
            spo2: None,
            gcs: None,
        }
    }

    fn breakdown(total: u32) -> EwsBreakdown {
        EwsBreakdown {
            total,
            per_vital: Vec::new(),
        }
    }

    #[test]
    fn risk_is_monotonic_in_ews() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());

        let mut last = -1.0;
        for ews in 0..=18 {
            let a = ensemble.assess(&breakdown(ews), None, &snap);
            assert!(
                a.risk_score >= last,
                "risk decreased at ews {ews}: {} < {last}",
                a.risk_score
            );
            last = a.risk_score;
        }
    }

    #[test]
    fn risk_is_monotonic_in_ews_with_model() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());

        let mut last = -1.0;
        for ews in 0..=18 {
            let model = ModelOutput {
                probability: 0.35,
                attributions: vec![],
            };
            let a = ensemble.assess(&breakdown(ews), Some(model), &snap);
            assert!(a.risk_score >= last);
            last = a.risk_score;
        }
    }

    #[test]
    fn scores_above_cap_saturate() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());
        let at_cap = ensemble.assess(&breakdown(12), None, &snap);
        let above_cap = ensemble.assess(&breakdown(18), None, &snap);
        assert!((at_cap.risk_score - 1.0).abs() < f64::EPSILON);
        assert!((above_cap.risk_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn model_blending_uses_configured_weights() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());
        let model = ModelOutput {
            probability: 0.5,
            attributions: vec![],
        };
        // ews 6 of cap 12 -> normalized 0.5; 0.6*0.5 + 0.4*0.5 = 0.5
        let a = ensemble.assess(&breakdown(6), Some(model), &snap);
        assert!((a.risk_score - 0.5).abs() < 1e-9);
        assert!(a.model_used);
    }

    #[test]
    fn missing_model_caps_confidence_not_risk() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());
        let a = ensemble.assess(&breakdown(12), None, &snap);
        assert!((a.risk_score - 1.0).abs() < f64::EPSILON);
        assert!(a.confidence <= 0.5);
        assert!(!a.model_used);
    }

    #[test]
    fn empty_panel_yields_floor_assessment() {
        let ensemble = RiskEnsemble::default();
        let mut s = sample();
        s.heart_rate = None;
        let snap = snapshot_for(s);
        let a = ensemble.assess(&breakdown(0), None, &snap);
        assert!((a.risk_score - 0.1).abs() < f64::EPSILON);
        assert!(a.confidence.abs() < f64::EPSILON);
        assert!(a.contributing_factors.is_empty());
    }

    #[test]
    fn confidence_scales_with_panel_completeness() {
        let ensemble = RiskEnsemble::default();

        let one_vital = snapshot_for(sample());
        let mut full = sample();
        full.bp_systolic = Some(120.0);
        full.respiratory_rate = Some(16.0);
        full.temperature = Some(37.0);
        full.spo2 = Some(98.0);
        full.gcs = Some(15);
        let full_panel = snapshot_for(full);

        let sparse = ensemble.assess(&breakdown(0), None, &one_vital);
        let complete = ensemble.assess(&breakdown(0), None, &full_panel);
        assert!(complete.confidence > sparse.confidence);
    }

    #[test]
    fn factors_ranked_descending_with_fixed_tie_order() {
        let ensemble = RiskEnsemble::default();
        let ews = EwsCalculator::default();

        let mut s = sample();
        s.heart_rate = Some(125.0); // moderate (2)
        s.spo2 = Some(82.0); // severe (3)
        s.temperature = Some(38.2); // moderate (2) — ties with HR
        let snap = snapshot_for(s);
        let b = ews.score(&snap);

        let a = ensemble.assess(&b, None, &snap);
        let labels: Vec<&str> = a
            .contributing_factors
            .iter()
            .map(|f| f.factor.as_str())
            .collect();
        // spo2 (1.0) first, then the 2/3 tie resolved by canonical order:
        // heart_rate before temperature.
        assert_eq!(labels, vec!["spo2", "heart_rate", "temperature"]);
    }

    #[test]
    fn qsofa_surfaces_as_factor_when_positive() {
        let ensemble = RiskEnsemble::default();
        let ews = EwsCalculator::default();

        let mut s = sample();
        s.respiratory_rate = Some(24.0);
        s.bp_systolic = Some(95.0);
        let snap = snapshot_for(s);
        let b = ews.score(&snap);

        let a = ensemble.assess(&b, None, &snap);
        assert!(a.contributing_factors.iter().any(|f| f.factor == "qsofa"));
    }

    #[test]
    fn model_attributions_join_the_ranking() {
        let ensemble = RiskEnsemble::default();
        let snap = snapshot_for(sample());
        let model = ModelOutput {
            probability: 0.9,
            attributions: vec![("hr_trend_6h".to_string(), 0.7)],
        };
        let a = ensemble.assess(&breakdown(0), Some(model), &snap);
        assert_eq!(a.contributing_factors[0].factor, "hr_trend_6h");
    }
}
