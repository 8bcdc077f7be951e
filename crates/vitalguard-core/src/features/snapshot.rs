//! Derived feature values consumed by the scoring stages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PatientId, VitalKind, VitalSample};

/// Rolling statistics for one vital over one lookback horizon.
///
/// Computed only over readings actually present in the window; absent
/// readings are skipped, never imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalAggregate {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Minimum observed value.
    pub min: f64,
    /// Maximum observed value.
    pub max: f64,
    /// Least-squares slope in units per hour; `None` with fewer than two
    /// points (undefined, not zero).
    pub slope: Option<f64>,
    /// Number of readings that contributed.
    pub count: usize,
}

/// Aggregates for every vital observed within one horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonFeatures {
    /// Lookback span in seconds.
    pub horizon_secs: u64,
    /// Per-vital aggregates; vitals never observed in the horizon are absent.
    pub vitals: HashMap<VitalKind, VitalAggregate>,
}

impl HorizonFeatures {
    /// Aggregate for one vital within this horizon, if any reading existed.
    pub fn vital(&self, kind: VitalKind) -> Option<&VitalAggregate> {
        self.vitals.get(&kind)
    }
}

/// Point-in-time feature view for one patient.
///
/// A value type produced by [`FeatureWindow::snapshot`] on every ingest and
/// consumed once by the EWS calculator and risk ensemble; it is not
/// retained.
///
/// [`FeatureWindow::snapshot`]: super::FeatureWindow::snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// Owning patient.
    pub patient_id: PatientId,
    /// Timestamp of the newest sample.
    pub timestamp: DateTime<Utc>,
    /// The newest sample itself; tier scoring reads from here.
    pub latest: VitalSample,
    /// Per-horizon aggregates, shortest horizon first.
    pub horizons: Vec<HorizonFeatures>,
    /// Samples currently held in the window.
    pub window_len: usize,
    /// Vitals whose long-horizon slope exceeds the deterioration trend
    /// threshold (|slope| > 1 unit/hour for HR and RR).
    pub trend_flags: Vec<VitalKind>,
}

impl FeatureSnapshot {
    /// Aggregates for the given horizon length, if configured.
    pub fn horizon(&self, horizon_secs: u64) -> Option<&HorizonFeatures> {
        self.horizons.iter().find(|h| h.horizon_secs == horizon_secs)
    }
}

/// Compute aggregates from (elapsed-hours, value) pairs.
///
/// Returns `None` for an empty slice. The slope is a least-squares fit and
/// is `None` when fewer than two points exist or all points share one
/// abscissa (duplicate timestamps only).
pub(crate) fn aggregate(points: &[(f64, f64)]) -> Option<VitalAggregate> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &(_, v) in points {
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    let mean = sum / n;

    let var = points.iter().map(|&(_, v)| (v - mean).powi(2)).sum::<f64>() / n;

    Some(VitalAggregate {
        mean,
        std: var.sqrt(),
        min,
        max,
        slope: slope(points),
        count: points.len(),
    })
}

fn slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|&(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|&(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|&(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|&(x, _)| x * x).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denom)
}
