//! Engine façade: patient admission, sample routing, admin actions, and
//! event fan-out.
//!
//! The engine owns one worker task per admitted patient plus a single
//! dispatcher task. Workers send their outputs to the dispatcher, which
//! maintains the alert index, writes through to the optional store, and
//! only then broadcasts the event to subscribers. That ordering means a
//! subscriber acting on an event always finds the index and store already
//! consistent with it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use vitalguard_core::{
    EnsembleConfig, ModelProbability, PatientId, RawVitalSample, RiskAssessment, RiskEnsemble,
    SampleValidator, WindowConfig,
};

use crate::alert::{AlertId, AlertRecord};
use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;
use crate::events::AlertEvent;
use crate::lifecycle::LifecycleConfig;
use crate::store::AlertStore;
use crate::worker::{AdminCommand, PatientWorker, SampleQueue, WorkerOutput};

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Feature window settings shared by all patients.
    pub window: WindowConfig,
    /// Risk ensemble settings.
    pub ensemble: EnsembleConfig,
    /// Alert lifecycle settings.
    pub lifecycle: LifecycleConfig,
    /// Pending samples held per patient before drop-oldest kicks in
    /// (default 64).
    pub queue_capacity: usize,
    /// Buffered admin commands per patient worker (default 16).
    pub admin_channel_capacity: usize,
    /// Broadcast buffer for assessment and alert subscribers (default 256).
    pub event_channel_capacity: usize,
    /// Seconds between lifecycle sweep ticks (default 30).
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            ensemble: EnsembleConfig::default(),
            lifecycle: LifecycleConfig::default(),
            queue_capacity: 64,
            admin_channel_capacity: 16,
            event_channel_capacity: 256,
            sweep_interval_secs: 30,
        }
    }
}

/// Builder for [`Engine`], wiring the optional model, store, and clock.
pub struct EngineBuilder {
    config: EngineConfig,
    model: Option<Arc<dyn ModelProbability>>,
    store: Option<Arc<dyn AlertStore>>,
    clock: Arc<dyn Clock>,
}

impl EngineBuilder {
    /// Start from default configuration, no model, no store, system clock.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            model: None,
            store: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the full configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a pre-trained probability model.
    pub fn model(mut self, model: Arc<dyn ModelProbability>) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach an alert store for write-through persistence and restore on
    /// admission.
    pub fn store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the clock (manual clocks make lifecycle timing testable).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the engine and spawn its dispatcher task.
    pub fn build(self) -> Engine {
        Engine::spawn(self.config, self.model, self.store, self.clock)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct PatientHandle {
    queue: Arc<SampleQueue>,
    admin_tx: mpsc::Sender<AdminCommand>,
    task: JoinHandle<()>,
}

/// Maps open alerts to the patient worker that owns them, so admin
/// actions can be routed by alert id alone.
type AlertIndex = Arc<RwLock<HashMap<AlertId, PatientId>>>;

/// The deterioration monitoring engine.
pub struct Engine {
    config: EngineConfig,
    validator: SampleValidator,
    patients: RwLock<HashMap<PatientId, PatientHandle>>,
    alert_index: AlertIndex,
    assessments_tx: broadcast::Sender<RiskAssessment>,
    alerts_tx: broadcast::Sender<AlertEvent>,
    output_tx: mpsc::Sender<WorkerOutput>,
    model: Option<Arc<dyn ModelProbability>>,
    store: Option<Arc<dyn AlertStore>>,
    clock: Arc<dyn Clock>,
    dispatcher: JoinHandle<()>,
}

impl Engine {
    /// Builder entry point.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with defaults: no model, no store, system clock.
    pub fn with_defaults() -> Self {
        EngineBuilder::new().build()
    }

    fn spawn(
        config: EngineConfig,
        model: Option<Arc<dyn ModelProbability>>,
        store: Option<Arc<dyn AlertStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (assessments_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let (alerts_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let (output_tx, output_rx) = mpsc::channel(config.event_channel_capacity.max(1));

        let alert_index: AlertIndex = Arc::new(RwLock::new(HashMap::new()));
        let dispatcher = tokio::spawn(dispatch_loop(
            output_rx,
            alert_index.clone(),
            store.clone(),
            assessments_tx.clone(),
            alerts_tx.clone(),
        ));

        info!(
            queue_capacity = config.queue_capacity,
            sweep_interval_secs = config.sweep_interval_secs,
            persistent = store.is_some(),
            model = model.is_some(),
            "engine started"
        );

        Self {
            config,
            validator: SampleValidator::default(),
            patients: RwLock::new(HashMap::new()),
            alert_index,
            assessments_tx,
            alerts_tx,
            output_tx,
            model,
            store,
            clock,
            dispatcher,
        }
    }

    /// Ingest one raw sample. Validation failures are returned to the
    /// caller; an unknown patient is admitted lazily on first sample.
    ///
    /// Never blocks on a busy patient: if the patient's queue is full the
    /// oldest pending sample is dropped and the drop is logged.
    pub async fn ingest(&self, raw: RawVitalSample) -> Result<(), EngineError> {
        let sample = self.validator.validate(raw)?;
        let patient_id = sample.patient_id.clone();

        let queue = self.worker_queue(&patient_id).await?;
        if queue.push(sample) {
            warn!(
                patient_id = %patient_id,
                dropped_total = queue.dropped_total(),
                "sample queue full, dropped oldest pending sample"
            );
        }
        Ok(())
    }

    /// Discharge a patient: tears down their worker and returns the final
    /// alert state, if an alert was active.
    pub async fn discharge(
        &self,
        patient_id: &PatientId,
    ) -> Result<Option<AlertRecord>, EngineError> {
        let handle = {
            let mut patients = self.patients.write().await;
            patients
                .remove(patient_id)
                .ok_or_else(|| EngineError::UnknownPatient(patient_id.clone()))?
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .admin_tx
            .send(AdminCommand::Discharge { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Shutdown)?;
        let final_alert = reply_rx.await.map_err(|_| EngineError::Shutdown)?;

        info!(
            patient_id = %patient_id,
            had_active_alert = final_alert.is_some(),
            "patient discharged"
        );
        Ok(final_alert)
    }

    /// Acknowledge an open alert on the clinician's behalf.
    pub async fn acknowledge(
        &self,
        alert_id: &AlertId,
        by: &str,
    ) -> Result<AlertEvent, EngineError> {
        self.admin(alert_id, |reply| AdminCommand::Acknowledge {
            alert_id: *alert_id,
            by: by.to_string(),
            reply,
        })
        .await
    }

    /// Dismiss an alert and start the patient's reopen cooldown.
    pub async fn dismiss(&self, alert_id: &AlertId, by: &str) -> Result<AlertEvent, EngineError> {
        self.admin(alert_id, |reply| AdminCommand::Dismiss {
            alert_id: *alert_id,
            by: by.to_string(),
            reply,
        })
        .await
    }

    /// Subscribe to the stream of risk assessments (every processed
    /// sample yields one).
    pub fn subscribe_assessments(&self) -> broadcast::Receiver<RiskAssessment> {
        self.assessments_tx.subscribe()
    }

    /// Subscribe to alert lifecycle events.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alerts_tx.subscribe()
    }

    /// Number of currently admitted patients.
    pub async fn patient_count(&self) -> usize {
        self.patients.read().await.len()
    }

    /// The patient owning a currently indexed alert, if any.
    pub async fn alert_owner(&self, alert_id: &AlertId) -> Option<PatientId> {
        self.alert_index.read().await.get(alert_id).cloned()
    }

    async fn admin(
        &self,
        alert_id: &AlertId,
        make: impl FnOnce(oneshot::Sender<Result<AlertEvent, EngineError>>) -> AdminCommand,
    ) -> Result<AlertEvent, EngineError> {
        let patient_id = self
            .alert_owner(alert_id)
            .await
            .ok_or(EngineError::UnknownAlert(*alert_id))?;

        let admin_tx = {
            let patients = self.patients.read().await;
            patients
                .get(&patient_id)
                .map(|h| h.admin_tx.clone())
                .ok_or(EngineError::UnknownAlert(*alert_id))?
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        admin_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        reply_rx.await.map_err(|_| EngineError::Shutdown)?
    }

    /// Queue for an admitted patient, admitting them first if needed.
    async fn worker_queue(&self, patient_id: &PatientId) -> Result<Arc<SampleQueue>, EngineError> {
        {
            let patients = self.patients.read().await;
            if let Some(handle) = patients.get(patient_id) {
                return Ok(handle.queue.clone());
            }
        }

        // Load any persisted alert before taking the write lock; a slow
        // store must not block ingest for other patients.
        let restored = match &self.store {
            Some(store) => match store.load(patient_id).await {
                Ok(record) => record,
                Err(err) => {
                    warn!(patient_id = %patient_id, %err, "alert store unavailable on admission, starting clean");
                    None
                }
            },
            None => None,
        };

        let mut patients = self.patients.write().await;
        // Another ingest may have admitted the patient while we loaded.
        if let Some(handle) = patients.get(patient_id) {
            return Ok(handle.queue.clone());
        }

        // Index the restored alert whether active or retired: the
        // lifecycle can answer admin actions against either.
        if let Some(record) = restored.as_ref() {
            self.alert_index
                .write()
                .await
                .insert(record.id, patient_id.clone());
        }

        let queue = Arc::new(SampleQueue::new(self.config.queue_capacity));
        let (admin_tx, admin_rx) = mpsc::channel(self.config.admin_channel_capacity.max(1));
        let worker = PatientWorker::new(
            patient_id.clone(),
            queue.clone(),
            admin_rx,
            self.config.window.clone(),
            RiskEnsemble::new(self.config.ensemble.clone()),
            self.model.clone(),
            self.config.lifecycle.clone(),
            restored,
            self.clock.clone(),
            self.output_tx.clone(),
            self.config.sweep_interval_secs,
        );
        let task = tokio::spawn(worker.run());

        debug!(patient_id = %patient_id, "patient admitted");
        patients.insert(
            patient_id.clone(),
            PatientHandle {
                queue: queue.clone(),
                admin_tx,
                task,
            },
        );
        Ok(queue)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispatcher.abort();
        // Worker tasks stop on their own once the admin senders drop.
        for handle in self.patients.get_mut().values() {
            handle.task.abort();
        }
    }
}

/// Serializes index updates, persistence, and broadcast for all workers.
async fn dispatch_loop(
    mut output_rx: mpsc::Receiver<WorkerOutput>,
    alert_index: AlertIndex,
    store: Option<Arc<dyn AlertStore>>,
    assessments_tx: broadcast::Sender<RiskAssessment>,
    alerts_tx: broadcast::Sender<AlertEvent>,
) {
    while let Some(output) = output_rx.recv().await {
        match output {
            WorkerOutput::Assessment(assessment) => {
                // No subscribers is fine.
                let _ = assessments_tx.send(assessment);
            }
            WorkerOutput::Alert(event) => {
                // Retired ids stay in the index so an action against a
                // closed alert reaches its worker and reports the closed
                // state; a patient's entries are purged on discharge.
                if let AlertEvent::Created { alert } = &event {
                    alert_index
                        .write()
                        .await
                        .insert(alert.id, alert.patient_id.clone());
                }
                persist(&store, event.alert()).await;
                let _ = alerts_tx.send(event);
            }
            WorkerOutput::Discharged {
                patient_id,
                final_alert,
            } => {
                alert_index
                    .write()
                    .await
                    .retain(|_, owner| owner != &patient_id);
                if let Some(alert) = final_alert {
                    persist(&store, &alert).await;
                }
                debug!(patient_id = %patient_id, "worker teardown complete");
            }
        }
    }
}

async fn persist(store: &Option<Arc<dyn AlertStore>>, record: &AlertRecord) {
    if let Some(store) = store {
        if let Err(err) = store.save(record).await {
            // Persistence is best-effort; the in-memory lifecycle stays
            // authoritative.
            error!(alert_id = %record.id, %err, "failed to persist alert record");
        }
    }
}
