//! Bounded per-patient history of recent vital samples.

use std::collections::{HashMap, VecDeque};

use chrono::Duration as ChronoDuration;

use crate::domain::{VitalKind, VitalSample};

use super::snapshot::{aggregate, FeatureSnapshot, HorizonFeatures};

/// Deterioration trend threshold, units per hour. A heart rate or
/// respiratory rate drifting faster than this over the long horizon is
/// flagged as a deterioration indicator.
const TREND_FLAG_SLOPE: f64 = 1.0;

/// Configuration for feature windows.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Lookback horizons in seconds, shortest first (default 1 h and 6 h).
    pub horizons_secs: Vec<u64>,
    /// Hard cap on retained samples (default 1440 ≈ 24 h at one per minute).
    /// The oldest samples are silently evicted past this, guaranteeing
    /// O(window) memory per patient regardless of stream length.
    pub max_samples: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            horizons_secs: vec![3600, 21_600],
            max_samples: 1440,
        }
    }
}

impl WindowConfig {
    /// The longest configured horizon; samples older than this are evicted.
    pub fn longest_horizon_secs(&self) -> u64 {
        self.horizons_secs.iter().copied().max().unwrap_or(21_600)
    }
}

/// Ring buffer of one patient's recent samples plus derived aggregates.
///
/// Owned exclusively by the feature extraction stage; mutated only by
/// appending validated samples. Samples older than the longest horizon
/// (relative to the newest sample's timestamp) never survive an ingest.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    samples: VecDeque<VitalSample>,
    config: WindowConfig,
}

impl FeatureWindow {
    /// Create an empty window. A zero `max_samples` is clamped to one.
    pub fn new(mut config: WindowConfig) -> Self {
        config.max_samples = config.max_samples.max(1);
        Self {
            samples: VecDeque::new(),
            config,
        }
    }

    /// Append a sample, evict expired history, and derive a fresh snapshot.
    pub fn ingest(&mut self, sample: VitalSample) -> FeatureSnapshot {
        self.samples.push_back(sample);
        self.evict();
        // Eviction keeps the newest sample, so the window is non-empty here.
        self.snapshot_of(self.samples.len() - 1)
    }

    fn evict(&mut self) {
        while self.samples.len() > self.config.max_samples {
            self.samples.pop_front();
        }
        let newest = match self.samples.back() {
            Some(s) => s.timestamp,
            None => return,
        };
        let horizon = ChronoDuration::seconds(self.config.longest_horizon_secs() as i64);
        let cutoff = newest - horizon;
        while let Some(front) = self.samples.front() {
            if front.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Derive the current feature snapshot, or `None` for an empty window.
    ///
    /// Aggregates are computed per horizon per vital over present readings
    /// only.
    pub fn snapshot(&self) -> Option<FeatureSnapshot> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.snapshot_of(self.samples.len() - 1))
    }

    fn snapshot_of(&self, latest_index: usize) -> FeatureSnapshot {
        let latest = self.samples[latest_index].clone();
        let reference = latest.timestamp;

        let mut horizons = Vec::with_capacity(self.config.horizons_secs.len());
        for &horizon_secs in &self.config.horizons_secs {
            let cutoff = reference - ChronoDuration::seconds(horizon_secs as i64);
            let mut vitals = HashMap::new();

            for kind in VitalKind::ALL {
                let points: Vec<(f64, f64)> = self
                    .samples
                    .iter()
                    .filter(|s| s.timestamp >= cutoff)
                    .filter_map(|s| {
                        s.value(kind)
                            .map(|v| ((s.timestamp - cutoff).num_seconds() as f64 / 3600.0, v))
                    })
                    .collect();
                if let Some(agg) = aggregate(&points) {
                    vitals.insert(kind, agg);
                }
            }
            horizons.push(HorizonFeatures {
                horizon_secs,
                vitals,
            });
        }

        let trend_flags = self.trend_flags(&horizons);

        FeatureSnapshot {
            patient_id: latest.patient_id.clone(),
            timestamp: reference,
            latest,
            horizons,
            window_len: self.samples.len(),
            trend_flags,
        }
    }

    /// HR/RR vitals drifting faster than the trend threshold over the
    /// longest horizon.
    fn trend_flags(&self, horizons: &[HorizonFeatures]) -> Vec<VitalKind> {
        let longest = self.config.longest_horizon_secs();
        let Some(h) = horizons.iter().find(|h| h.horizon_secs == longest) else {
            return Vec::new();
        };
        [VitalKind::HeartRate, VitalKind::RespiratoryRate]
            .into_iter()
            .filter(|kind| {
                h.vital(*kind)
                    .and_then(|agg| agg.slope)
                    .map(|s| s.abs() > TREND_FLAG_SLOPE)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The newest retained sample.
    pub fn latest(&self) -> Option<&VitalSample> {
        self.samples.back()
    }
}
