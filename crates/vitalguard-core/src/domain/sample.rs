//! Patient identifiers and vital sign samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a patient.
///
/// Patient ids are assigned by the surrounding admission system; the engine
/// treats them as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Create a patient id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PatientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The vital signs the scoring pipeline understands.
///
/// The declaration order is the canonical tie-break order used when ranking
/// contributing factors: HR, systolic BP, RR, temperature, SpO2, GCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    /// Heart rate in beats per minute.
    HeartRate,
    /// Systolic blood pressure in mmHg.
    SystolicBp,
    /// Respiratory rate in breaths per minute.
    RespiratoryRate,
    /// Core body temperature in °C.
    Temperature,
    /// Peripheral oxygen saturation in percent.
    SpO2,
    /// Glasgow Coma Scale (3-15).
    Gcs,
}

impl VitalKind {
    /// All scored vitals in canonical order.
    pub const ALL: [VitalKind; 6] = [
        VitalKind::HeartRate,
        VitalKind::SystolicBp,
        VitalKind::RespiratoryRate,
        VitalKind::Temperature,
        VitalKind::SpO2,
        VitalKind::Gcs,
    ];

    /// Stable display label (matches the wire field names).
    pub fn label(&self) -> &'static str {
        match self {
            VitalKind::HeartRate => "heart_rate",
            VitalKind::SystolicBp => "bp_systolic",
            VitalKind::RespiratoryRate => "respiratory_rate",
            VitalKind::Temperature => "temperature",
            VitalKind::SpO2 => "spo2",
            VitalKind::Gcs => "gcs",
        }
    }

    /// Position in the canonical tie-break order.
    pub fn order_index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(usize::MAX)
    }
}

impl std::fmt::Display for VitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A vitals measurement as it arrives off the wire, before validation.
///
/// Every field is optional: upstream monitors report partial panels, and
/// the validator decides which omissions are fatal (id, timestamp) versus
/// merely unknown (individual vitals).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVitalSample {
    /// Patient identifier; required.
    pub patient_id: Option<String>,
    /// Measurement time; required.
    pub timestamp: Option<DateTime<Utc>>,
    /// Heart rate, BPM.
    pub heart_rate: Option<f64>,
    /// Systolic blood pressure, mmHg.
    pub bp_systolic: Option<f64>,
    /// Diastolic blood pressure, mmHg.
    pub bp_diastolic: Option<f64>,
    /// Respiratory rate, breaths/min.
    pub respiratory_rate: Option<f64>,
    /// Temperature, °C.
    pub temperature: Option<f64>,
    /// Oxygen saturation, percent.
    pub spo2: Option<f64>,
    /// Glasgow Coma Scale, 3-15.
    pub gcs: Option<f64>,
}

/// A validated, immutable vitals measurement.
///
/// Missing vitals mean "not measured", never zero. Duplicate timestamps for
/// the same patient are legal and treated as distinct readings in arrival
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSample {
    /// Owning patient.
    pub patient_id: PatientId,
    /// Measurement time.
    pub timestamp: DateTime<Utc>,
    /// Heart rate, BPM.
    pub heart_rate: Option<f64>,
    /// Systolic blood pressure, mmHg.
    pub bp_systolic: Option<f64>,
    /// Diastolic blood pressure, mmHg. Stored but not scored.
    pub bp_diastolic: Option<f64>,
    /// Respiratory rate, breaths/min.
    pub respiratory_rate: Option<f64>,
    /// Temperature, °C.
    pub temperature: Option<f64>,
    /// Oxygen saturation, percent.
    pub spo2: Option<f64>,
    /// Glasgow Coma Scale, 3-15.
    pub gcs: Option<u8>,
}

impl VitalSample {
    /// Read one scored vital by kind.
    pub fn value(&self, kind: VitalKind) -> Option<f64> {
        match kind {
            VitalKind::HeartRate => self.heart_rate,
            VitalKind::SystolicBp => self.bp_systolic,
            VitalKind::RespiratoryRate => self.respiratory_rate,
            VitalKind::Temperature => self.temperature,
            VitalKind::SpO2 => self.spo2,
            VitalKind::Gcs => self.gcs.map(f64::from),
        }
    }

    /// Number of scored vitals present in this sample.
    pub fn present_count(&self) -> usize {
        VitalKind::ALL
            .iter()
            .filter(|k| self.value(**k).is_some())
            .count()
    }

    /// The scored vitals present in this sample, in canonical order.
    pub fn present_kinds(&self) -> Vec<VitalKind> {
        VitalKind::ALL
            .iter()
            .copied()
            .filter(|k| self.value(*k).is_some())
            .collect()
    }
}
