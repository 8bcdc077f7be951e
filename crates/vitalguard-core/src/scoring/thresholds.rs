//! Canonical tiered threshold table for vital sign abnormality.
//!
//! One versioned table for the whole system. Boundaries are fixed and
//! non-overlapping; every vital maps any value to exactly one tier.
//! SpO2 is asymmetric: only low saturations score.

use serde::{Deserialize, Serialize};

use crate::domain::VitalKind;

/// Version tag of the boundary set below. Bump when boundaries change so
/// stored assessments stay interpretable.
pub const THRESHOLDS_VERSION: &str = "2025.1";

/// Abnormality tier for a single vital reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Within the normal range; scores 0.
    Normal,
    /// Mildly abnormal; scores 1.
    Mild,
    /// Moderately abnormal; scores 2.
    Moderate,
    /// Severely abnormal; scores 3.
    Severe,
}

impl Tier {
    /// EWS points contributed by this tier.
    pub fn points(&self) -> u8 {
        match self {
            Tier::Normal => 0,
            Tier::Mild => 1,
            Tier::Moderate => 2,
            Tier::Severe => 3,
        }
    }
}

/// The canonical threshold table.
///
/// | vital | severe | moderate | mild | normal |
/// |---|---|---|---|---|
/// | HR | <40, >130 | 40-49, 121-130 | 50-59, 101-120 | 60-100 |
/// | RR | <8, >30 | 8-9, 26-30 | 10-11, 21-25 | 12-20 |
/// | Temp | <35.5, >38.5 | 35.5-35.9, 38.1-38.5 | 36.0-36.4, 37.6-38.0 | 36.5-37.5 |
/// | Sys BP | <90, >180 | 90-99, 161-180 | 100-109, 141-160 | 110-140 |
/// | SpO2 | <85 | 85-89 | 90-93 | >=94 |
/// | GCS | <9 | 9-11 | 12-14 | 15 |
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdTable;

impl ThresholdTable {
    /// Version tag of this boundary set.
    pub fn version(&self) -> &'static str {
        THRESHOLDS_VERSION
    }

    /// Tier for one vital reading.
    pub fn tier(&self, kind: VitalKind, value: f64) -> Tier {
        match kind {
            VitalKind::HeartRate => {
                if value < 40.0 || value > 130.0 {
                    Tier::Severe
                } else if value < 50.0 || value > 120.0 {
                    Tier::Moderate
                } else if value < 60.0 || value > 100.0 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
            VitalKind::RespiratoryRate => {
                if value < 8.0 || value > 30.0 {
                    Tier::Severe
                } else if value < 10.0 || value > 25.0 {
                    Tier::Moderate
                } else if value < 12.0 || value > 20.0 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
            VitalKind::Temperature => {
                if value < 35.5 || value > 38.5 {
                    Tier::Severe
                } else if value < 36.0 || value > 38.0 {
                    Tier::Moderate
                } else if value < 36.5 || value > 37.5 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
            VitalKind::SystolicBp => {
                if value < 90.0 || value > 180.0 {
                    Tier::Severe
                } else if value < 100.0 || value > 160.0 {
                    Tier::Moderate
                } else if value < 110.0 || value > 140.0 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
            VitalKind::SpO2 => {
                if value < 85.0 {
                    Tier::Severe
                } else if value < 90.0 {
                    Tier::Moderate
                } else if value < 94.0 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
            VitalKind::Gcs => {
                if value < 9.0 {
                    Tier::Severe
                } else if value < 12.0 {
                    Tier::Moderate
                } else if value < 15.0 {
                    Tier::Mild
                } else {
                    Tier::Normal
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(kind: VitalKind, value: f64) -> Tier {
        ThresholdTable.tier(kind, value)
    }

    #[test]
    fn heart_rate_boundaries_both_sides() {
        assert_eq!(tier(VitalKind::HeartRate, 39.0), Tier::Severe);
        assert_eq!(tier(VitalKind::HeartRate, 40.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::HeartRate, 49.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::HeartRate, 50.0), Tier::Mild);
        assert_eq!(tier(VitalKind::HeartRate, 59.0), Tier::Mild);
        assert_eq!(tier(VitalKind::HeartRate, 60.0), Tier::Normal);
        assert_eq!(tier(VitalKind::HeartRate, 100.0), Tier::Normal);
        assert_eq!(tier(VitalKind::HeartRate, 101.0), Tier::Mild);
        // The documented boundary pair: 120 and 121 fall in different tiers.
        assert_eq!(tier(VitalKind::HeartRate, 120.0), Tier::Mild);
        assert_eq!(tier(VitalKind::HeartRate, 121.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::HeartRate, 130.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::HeartRate, 131.0), Tier::Severe);
    }

    #[test]
    fn respiratory_rate_boundaries_both_sides() {
        assert_eq!(tier(VitalKind::RespiratoryRate, 7.0), Tier::Severe);
        assert_eq!(tier(VitalKind::RespiratoryRate, 8.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::RespiratoryRate, 10.0), Tier::Mild);
        assert_eq!(tier(VitalKind::RespiratoryRate, 12.0), Tier::Normal);
        assert_eq!(tier(VitalKind::RespiratoryRate, 20.0), Tier::Normal);
        assert_eq!(tier(VitalKind::RespiratoryRate, 21.0), Tier::Mild);
        assert_eq!(tier(VitalKind::RespiratoryRate, 26.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::RespiratoryRate, 31.0), Tier::Severe);
    }

    #[test]
    fn temperature_boundaries_both_sides() {
        assert_eq!(tier(VitalKind::Temperature, 35.4), Tier::Severe);
        assert_eq!(tier(VitalKind::Temperature, 35.5), Tier::Moderate);
        assert_eq!(tier(VitalKind::Temperature, 36.0), Tier::Mild);
        assert_eq!(tier(VitalKind::Temperature, 36.5), Tier::Normal);
        assert_eq!(tier(VitalKind::Temperature, 37.5), Tier::Normal);
        assert_eq!(tier(VitalKind::Temperature, 37.6), Tier::Mild);
        assert_eq!(tier(VitalKind::Temperature, 38.1), Tier::Moderate);
        assert_eq!(tier(VitalKind::Temperature, 38.6), Tier::Severe);
    }

    #[test]
    fn systolic_bp_boundaries_both_sides() {
        assert_eq!(tier(VitalKind::SystolicBp, 89.0), Tier::Severe);
        assert_eq!(tier(VitalKind::SystolicBp, 90.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::SystolicBp, 100.0), Tier::Mild);
        assert_eq!(tier(VitalKind::SystolicBp, 110.0), Tier::Normal);
        assert_eq!(tier(VitalKind::SystolicBp, 140.0), Tier::Normal);
        assert_eq!(tier(VitalKind::SystolicBp, 141.0), Tier::Mild);
        assert_eq!(tier(VitalKind::SystolicBp, 161.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::SystolicBp, 181.0), Tier::Severe);
    }

    #[test]
    fn spo2_is_asymmetric() {
        assert_eq!(tier(VitalKind::SpO2, 84.0), Tier::Severe);
        assert_eq!(tier(VitalKind::SpO2, 85.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::SpO2, 89.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::SpO2, 90.0), Tier::Mild);
        assert_eq!(tier(VitalKind::SpO2, 93.0), Tier::Mild);
        assert_eq!(tier(VitalKind::SpO2, 94.0), Tier::Normal);
        // High saturation never scores.
        assert_eq!(tier(VitalKind::SpO2, 100.0), Tier::Normal);
    }

    #[test]
    fn gcs_boundaries_both_sides() {
        assert_eq!(tier(VitalKind::Gcs, 8.0), Tier::Severe);
        assert_eq!(tier(VitalKind::Gcs, 9.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::Gcs, 11.0), Tier::Moderate);
        assert_eq!(tier(VitalKind::Gcs, 12.0), Tier::Mild);
        assert_eq!(tier(VitalKind::Gcs, 14.0), Tier::Mild);
        assert_eq!(tier(VitalKind::Gcs, 15.0), Tier::Normal);
    }

    #[test]
    fn tier_points() {
        assert_eq!(Tier::Normal.points(), 0);
        assert_eq!(Tier::Mild.points(), 1);
        assert_eq!(Tier::Moderate.points(), 2);
        assert_eq!(Tier::Severe.points(), 3);
    }
}
