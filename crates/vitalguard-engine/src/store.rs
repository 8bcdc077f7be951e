//! Alert persistence seam.
//!
//! Durability across restarts is optional: the engine cold-starts a
//! patient to no alert when the store is absent or failing. Saves happen
//! off the scoring path; a failed save is logged, never propagated into
//! the pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use vitalguard_core::PatientId;

use crate::alert::AlertRecord;

/// Alert store failure.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend unreachable or refusing the operation.
    #[error("alert store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for the latest alert record per patient.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Load the persisted alert for a patient, if any.
    async fn load(&self, patient_id: &PatientId) -> Result<Option<AlertRecord>, StoreError>;

    /// Persist the latest state of an alert.
    async fn save(&self, record: &AlertRecord) -> Result<(), StoreError>;
}

/// In-memory store, for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    records: RwLock<HashMap<PatientId, AlertRecord>>,
}

impl InMemoryAlertStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a record (restart simulation in tests).
    pub fn insert(&self, record: AlertRecord) {
        self.records
            .write()
            .insert(record.patient_id.clone(), record);
    }

    /// Read a record synchronously (test inspection).
    pub fn get(&self, patient_id: &PatientId) -> Option<AlertRecord> {
        self.records.read().get(patient_id).cloned()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn load(&self, patient_id: &PatientId) -> Result<Option<AlertRecord>, StoreError> {
        Ok(self.records.read().get(patient_id).cloned())
    }

    async fn save(&self, record: &AlertRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(record.patient_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn round_trips_records() {
        let store = InMemoryAlertStore::new();
        let patient: PatientId = "P-1".into();
        assert!(store.load(&patient).await.unwrap().is_none());

        let record = AlertRecord::open(patient.clone(), 0.7, Utc::now());
        store.save(&record).await.unwrap();

        let loaded = store.load(&patient).await.unwrap().unwrap();
        assert_eq!(loaded.id, record.id);
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let store = InMemoryAlertStore::new();
        let patient: PatientId = "P-1".into();

        let first = AlertRecord::open(patient.clone(), 0.7, Utc::now());
        store.save(&first).await.unwrap();
        let second = AlertRecord::open(patient.clone(), 0.9, Utc::now());
        store.save(&second).await.unwrap();

        let loaded = store.load(&patient).await.unwrap().unwrap();
        assert_eq!(loaded.id, second.id);
    }
}
