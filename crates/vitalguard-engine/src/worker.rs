//! Per-patient scoring worker.
//!
//! Each admitted patient gets exactly one worker task owning that
//! patient's feature window and alert lifecycle, so all processing for a
//! patient is serialized by construction and no cross-patient lock is
//! ever taken on the hot path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::{interval, Duration as TokioDuration, MissedTickBehavior};
use tracing::{debug, warn};

use vitalguard_core::{
    EwsCalculator, FeatureWindow, ModelProbability, PatientId, RiskAssessment, RiskEnsemble,
    VitalSample, WindowConfig,
};

use crate::alert::{AlertId, AlertRecord};
use crate::clock::Clock;
use crate::error::EngineError;
use crate::events::AlertEvent;
use crate::lifecycle::{AlertLifecycle, LifecycleConfig};

/// Bounded per-patient sample queue with drop-oldest backpressure.
///
/// When the queue is full the oldest pending sample is discarded rather
/// than blocking the producer: the freshest vitals are the clinically
/// relevant ones.
#[derive(Debug)]
pub struct SampleQueue {
    inner: Mutex<VecDeque<VitalSample>>,
    capacity: usize,
    notify: Notify,
    dropped: AtomicU64,
}

impl SampleQueue {
    /// Queue with the given capacity (clamped to at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a sample, evicting the oldest pending one if full.
    /// Returns `true` if an eviction happened.
    pub fn push(&self, sample: VitalSample) -> bool {
        let evicted = {
            let mut queue = self.inner.lock();
            let evicted = if queue.len() >= self.capacity {
                queue.pop_front();
                true
            } else {
                false
            };
            queue.push_back(sample);
            evicted
        };
        if evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.notify.notify_one();
        evicted
    }

    /// Dequeue the oldest pending sample.
    pub fn pop(&self) -> Option<VitalSample> {
        self.inner.lock().pop_front()
    }

    /// Samples currently pending.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Total samples discarded under backpressure since admission.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Administrative actions routed to a patient's worker.
#[derive(Debug)]
pub enum AdminCommand {
    /// Acknowledge an open alert.
    Acknowledge {
        alert_id: AlertId,
        by: String,
        reply: oneshot::Sender<Result<AlertEvent, EngineError>>,
    },
    /// Dismiss an open or acknowledged alert.
    Dismiss {
        alert_id: AlertId,
        by: String,
        reply: oneshot::Sender<Result<AlertEvent, EngineError>>,
    },
    /// Tear the worker down, returning the final alert state for
    /// persistence.
    Discharge {
        reply: oneshot::Sender<Option<AlertRecord>>,
    },
}

/// Outputs a worker sends back to the engine dispatcher.
#[derive(Debug)]
pub(crate) enum WorkerOutput {
    Assessment(RiskAssessment),
    Alert(AlertEvent),
    Discharged {
        patient_id: PatientId,
        final_alert: Option<AlertRecord>,
    },
}

/// One patient's scoring pipeline: queue → features → EWS → ensemble →
/// lifecycle.
pub(crate) struct PatientWorker {
    patient_id: PatientId,
    queue: Arc<SampleQueue>,
    admin_rx: mpsc::Receiver<AdminCommand>,
    window: FeatureWindow,
    ews: EwsCalculator,
    ensemble: RiskEnsemble,
    model: Option<Arc<dyn ModelProbability>>,
    lifecycle: AlertLifecycle,
    clock: Arc<dyn Clock>,
    output_tx: mpsc::Sender<WorkerOutput>,
    sweep_interval_secs: u64,
}

impl PatientWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        patient_id: PatientId,
        queue: Arc<SampleQueue>,
        admin_rx: mpsc::Receiver<AdminCommand>,
        window_config: WindowConfig,
        ensemble: RiskEnsemble,
        model: Option<Arc<dyn ModelProbability>>,
        lifecycle_config: LifecycleConfig,
        restored: Option<AlertRecord>,
        clock: Arc<dyn Clock>,
        output_tx: mpsc::Sender<WorkerOutput>,
        sweep_interval_secs: u64,
    ) -> Self {
        let now = clock.now();
        let lifecycle = match restored {
            Some(record) => AlertLifecycle::with_restored(lifecycle_config, record, now),
            None => AlertLifecycle::new(lifecycle_config),
        };
        Self {
            patient_id,
            queue,
            admin_rx,
            window: FeatureWindow::new(window_config),
            ews: EwsCalculator::default(),
            ensemble,
            model,
            lifecycle,
            clock,
            output_tx,
            sweep_interval_secs,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(patient_id = %self.patient_id, "patient worker started");
        let mut sweep = interval(TokioDuration::from_secs(self.sweep_interval_secs.max(1)));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.queue.wait() => {
                    while let Some(sample) = self.queue.pop() {
                        self.process_sample(sample).await;
                    }
                }
                cmd = self.admin_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_admin(cmd).await {
                                break;
                            }
                        }
                        // Engine dropped the handle: shut down.
                        None => break,
                    }
                }
                _ = sweep.tick() => {
                    if let Some(event) = self.lifecycle.on_tick(self.clock.now()) {
                        self.emit(WorkerOutput::Alert(event)).await;
                    }
                }
            }
        }
        debug!(patient_id = %self.patient_id, "patient worker stopped");
    }

    async fn process_sample(&mut self, sample: VitalSample) {
        let snapshot = self.window.ingest(sample);

        let model_output = match &self.model {
            Some(model) => match model.probability(&snapshot) {
                Ok(output) => Some(output),
                Err(err) => {
                    // Degrade to the clinical score alone rather than
                    // dropping the assessment.
                    warn!(patient_id = %self.patient_id, %err, "model unavailable, scoring without it");
                    None
                }
            },
            None => None,
        };

        let breakdown = self.ews.score(&snapshot);
        let assessment = self.ensemble.assess(&breakdown, model_output, &snapshot);

        let event = self
            .lifecycle
            .on_assessment(&assessment, self.clock.now());

        self.emit(WorkerOutput::Assessment(assessment)).await;
        if let Some(event) = event {
            self.emit(WorkerOutput::Alert(event)).await;
        }
    }

    /// Returns `true` when the worker should terminate.
    async fn handle_admin(&mut self, cmd: AdminCommand) -> bool {
        match cmd {
            AdminCommand::Acknowledge { alert_id, by, reply } => {
                let result = self.lifecycle.acknowledge(&alert_id, &by, self.clock.now());
                if let Ok(event) = &result {
                    self.emit(WorkerOutput::Alert(event.clone())).await;
                }
                let _ = reply.send(result);
                false
            }
            AdminCommand::Dismiss { alert_id, by, reply } => {
                let result = self.lifecycle.dismiss(&alert_id, &by, self.clock.now());
                if let Ok(event) = &result {
                    self.emit(WorkerOutput::Alert(event.clone())).await;
                }
                let _ = reply.send(result);
                false
            }
            AdminCommand::Discharge { reply } => {
                let final_alert = self.lifecycle.current().cloned();
                self.emit(WorkerOutput::Discharged {
                    patient_id: self.patient_id.clone(),
                    final_alert: final_alert.clone(),
                })
                .await;
                let _ = reply.send(final_alert);
                true
            }
        }
    }

    async fn emit(&self, output: WorkerOutput) {
        if self.output_tx.send(output).await.is_err() {
            debug!(patient_id = %self.patient_id, "dispatcher gone, dropping worker output");
        }
    }
}
