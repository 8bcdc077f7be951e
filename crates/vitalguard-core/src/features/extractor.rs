//! Multi-patient feature extraction front.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{PatientId, VitalSample};

use super::snapshot::FeatureSnapshot;
use super::window::{FeatureWindow, WindowConfig};

/// Maintains one [`FeatureWindow`] per patient, created lazily on the first
/// sample and dropped on discharge.
///
/// This type is single-threaded by design; the engine gives each patient
/// worker its own window, so the map form here is what batch callers and
/// tests use.
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    config: WindowConfig,
    windows: HashMap<PatientId, FeatureWindow>,
}

impl FeatureExtractor {
    /// Create an extractor with custom window configuration.
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Ingest one validated sample and return the fresh feature snapshot.
    pub fn ingest(&mut self, sample: VitalSample) -> FeatureSnapshot {
        let window = self
            .windows
            .entry(sample.patient_id.clone())
            .or_insert_with(|| {
                debug!(patient_id = %sample.patient_id, "creating feature window");
                FeatureWindow::new(self.config.clone())
            });
        window.ingest(sample)
    }

    /// Drop a patient's window. Returns whether one existed.
    pub fn remove(&mut self, patient_id: &PatientId) -> bool {
        self.windows.remove(patient_id).is_some()
    }

    /// Access a patient's window, if admitted.
    pub fn window(&self, patient_id: &PatientId) -> Option<&FeatureWindow> {
        self.windows.get(patient_id)
    }

    /// Number of patients with live windows.
    pub fn patient_count(&self) -> usize {
        self.windows.len()
    }
}
