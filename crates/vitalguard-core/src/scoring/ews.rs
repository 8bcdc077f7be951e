//! Early Warning Score calculation.

use crate::domain::{VitalKind, VitalSample};
use crate::features::FeatureSnapshot;

use super::thresholds::ThresholdTable;

/// Per-vital tier points plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EwsBreakdown {
    /// Sum of all present per-vital sub-scores. Not capped; six severe
    /// vitals score 18.
    pub total: u32,
    /// Sub-score per present vital, in canonical vital order. Vitals absent
    /// from the sample do not appear: missing data is not deterioration
    /// evidence.
    pub per_vital: Vec<(VitalKind, u8)>,
}

/// Tiered clinical scorer, independent of any trained model.
///
/// Stateless and order-independent: the same snapshot always yields the
/// same score.
#[derive(Debug, Clone, Copy, Default)]
pub struct EwsCalculator {
    table: ThresholdTable,
}

impl EwsCalculator {
    /// Score the latest sample in a snapshot.
    pub fn score(&self, snapshot: &FeatureSnapshot) -> EwsBreakdown {
        self.score_sample(&snapshot.latest)
    }

    /// Score one sample directly.
    pub fn score_sample(&self, sample: &VitalSample) -> EwsBreakdown {
        let mut per_vital = Vec::new();
        let mut total = 0u32;
        for kind in VitalKind::ALL {
            if let Some(value) = sample.value(kind) {
                let points = self.table.tier(kind, value).points();
                total += u32::from(points);
                per_vital.push((kind, points));
            }
        }
        EwsBreakdown { total, per_vital }
    }
}

/// qSOFA-derived sepsis screen risk.
///
/// Respiratory rate >=22, systolic BP <=100, and GCS <15 each score one
/// point; two or more map to 0.8, one to 0.4, none to 0.1. Used as a
/// contributing factor, not as a standalone alert source.
pub fn qsofa_risk(sample: &VitalSample) -> f64 {
    let mut points = 0u8;
    if sample.respiratory_rate.is_some_and(|rr| rr >= 22.0) {
        points += 1;
    }
    if sample.bp_systolic.is_some_and(|bp| bp <= 100.0) {
        points += 1;
    }
    if sample.gcs.is_some_and(|gcs| gcs < 15) {
        points += 1;
    }
    match points {
        0 => 0.1,
        1 => 0.4,
        _ => 0.8,
    }
}
