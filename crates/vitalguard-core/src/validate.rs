//! Vital sample validation.
//!
//! The validator rejects only impossible or corrupt data. Soft-abnormal
//! readings (HR 180, SpO2 82) are clinically meaningful and must flow
//! downstream to be scored, so the bounds here are deliberately wide.

use tracing::debug;

use crate::domain::{PatientId, RawVitalSample, VitalSample};
use crate::error::ValidationError;

/// Hard physiological bounds per vital (inclusive).
///
/// A reading outside these ranges cannot come from a living patient and is
/// treated as sensor corruption.
#[derive(Debug, Clone)]
pub struct PhysiologicalBounds {
    /// Heart rate, BPM.
    pub heart_rate: (f64, f64),
    /// Systolic blood pressure, mmHg.
    pub bp_systolic: (f64, f64),
    /// Diastolic blood pressure, mmHg.
    pub bp_diastolic: (f64, f64),
    /// Respiratory rate, breaths/min.
    pub respiratory_rate: (f64, f64),
    /// Temperature, °C.
    pub temperature: (f64, f64),
    /// Oxygen saturation, percent.
    pub spo2: (f64, f64),
    /// Glasgow Coma Scale.
    pub gcs: (f64, f64),
}

impl Default for PhysiologicalBounds {
    fn default() -> Self {
        Self {
            heart_rate: (0.0, 300.0),
            bp_systolic: (0.0, 300.0),
            bp_diastolic: (0.0, 200.0),
            respiratory_rate: (0.0, 80.0),
            temperature: (25.0, 45.0),
            spo2: (0.0, 100.0),
            gcs: (3.0, 15.0),
        }
    }
}

/// Validates raw samples into [`VitalSample`]s.
///
/// Pure: validation has no side effects and returns errors, it never
/// panics or throws them as control flow.
#[derive(Debug, Clone, Default)]
pub struct SampleValidator {
    bounds: PhysiologicalBounds,
}

impl SampleValidator {
    /// Create a validator with custom bounds.
    pub fn with_bounds(bounds: PhysiologicalBounds) -> Self {
        Self { bounds }
    }

    /// Validate one raw sample.
    ///
    /// Fails if the patient id or timestamp is absent, or if any present
    /// vital is NaN, infinite, or outside its hard bound. Absent vitals are
    /// legal and stay absent.
    pub fn validate(&self, raw: RawVitalSample) -> Result<VitalSample, ValidationError> {
        let patient_id = match raw.patient_id {
            Some(id) if !id.trim().is_empty() => PatientId::new(id),
            _ => return Err(ValidationError::MissingPatientId),
        };
        let timestamp = raw.timestamp.ok_or(ValidationError::MissingTimestamp)?;

        let heart_rate = check("heart_rate", raw.heart_rate, self.bounds.heart_rate)?;
        let bp_systolic = check("bp_systolic", raw.bp_systolic, self.bounds.bp_systolic)?;
        let bp_diastolic = check("bp_diastolic", raw.bp_diastolic, self.bounds.bp_diastolic)?;
        let respiratory_rate = check(
            "respiratory_rate",
            raw.respiratory_rate,
            self.bounds.respiratory_rate,
        )?;
        let temperature = check("temperature", raw.temperature, self.bounds.temperature)?;
        let spo2 = check("spo2", raw.spo2, self.bounds.spo2)?;
        let gcs = check("gcs", raw.gcs, self.bounds.gcs)?.map(|v| v.round() as u8);

        let sample = VitalSample {
            patient_id,
            timestamp,
            heart_rate,
            bp_systolic,
            bp_diastolic,
            respiratory_rate,
            temperature,
            spo2,
            gcs,
        };
        debug!(
            patient_id = %sample.patient_id,
            present = sample.present_count(),
            "validated vital sample"
        );
        Ok(sample)
    }
}

fn check(
    vital: &'static str,
    value: Option<f64>,
    (min, max): (f64, f64),
) -> Result<Option<f64>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) if !v.is_finite() => Err(ValidationError::NotFinite { vital }),
        Some(v) if v < min || v > max => Err(ValidationError::OutOfRange {
            vital,
            value: v,
            min,
            max,
        }),
        Some(v) => Ok(Some(v)),
    }
}
