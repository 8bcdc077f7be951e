//! Per-patient alert lifecycle state machine.
//!
//! States: none → Open → {Acknowledged, Dismissed} → (cooldown) → none.
//! Open alerts may also auto-resolve back to none when risk stays below
//! the close threshold for the dwell period.
//!
//! Two mechanisms stop alert flapping from noisy vitals:
//! - hysteresis: the open threshold (0.6) sits above the close
//!   threshold (0.5), so oscillation inside the gap changes nothing;
//! - cooldown: after a dismissal, reopening is suppressed for a fixed
//!   window even if risk stays high, so one underlying episode cannot
//!   regenerate the alert the operator just dealt with.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use vitalguard_core::RiskAssessment;

use crate::alert::{AlertRecord, AlertState, Severity};
use crate::error::EngineError;
use crate::events::AlertEvent;

/// Configuration for lifecycle behaviour.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Risk at or above which a new alert opens (default 0.6).
    pub open_threshold: f64,
    /// Risk below which an open alert starts its auto-resolve dwell
    /// (default 0.5; the gap below `open_threshold` is the hysteresis).
    pub close_threshold: f64,
    /// Seconds risk must stay below `close_threshold` before an open alert
    /// auto-resolves (default 600).
    pub resolve_dwell_secs: i64,
    /// Seconds after a dismissal during which no new alert opens for the
    /// patient (default 3600).
    pub cooldown_secs: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            open_threshold: 0.6,
            close_threshold: 0.5,
            resolve_dwell_secs: 600,
            cooldown_secs: 3600,
        }
    }
}

/// Fingerprint of the last processed assessment, for idempotent
/// re-delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AssessmentKey {
    timestamp: DateTime<Utc>,
    risk_bits: u64,
    ews: u32,
}

impl AssessmentKey {
    fn of(a: &RiskAssessment) -> Self {
        Self {
            timestamp: a.timestamp,
            risk_bits: a.risk_score.to_bits(),
            ews: a.ews_score,
        }
    }
}

/// Alert lifecycle for a single patient.
///
/// Owned exclusively by that patient's worker; all calls are serialized by
/// construction. Holds the at-most-one-active-alert invariant.
#[derive(Debug)]
pub struct AlertLifecycle {
    config: LifecycleConfig,
    current: Option<AlertRecord>,
    /// Most recently retired alert. Kept so an admin action against a
    /// closed alert can report its terminal state instead of claiming the
    /// id was never seen.
    retired: Option<AlertRecord>,
    suppressed_until: Option<DateTime<Utc>>,
    below_close_since: Option<DateTime<Utc>>,
    last_seen: Option<AssessmentKey>,
}

impl AlertLifecycle {
    /// Start with no alert (cold start).
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            current: None,
            retired: None,
            suppressed_until: None,
            below_close_since: None,
            last_seen: None,
        }
    }

    /// Start from a persisted record.
    ///
    /// An active record becomes the current alert. A dismissed record whose
    /// cooldown has not yet elapsed restores the suppression window; other
    /// retired records start clean.
    pub fn with_restored(config: LifecycleConfig, record: AlertRecord, now: DateTime<Utc>) -> Self {
        let mut lifecycle = Self::new(config);
        if record.is_active() {
            lifecycle.current = Some(record);
        } else {
            if record.state == AlertState::Dismissed {
                if let Some(closed_at) = record.closed_at {
                    let until = closed_at + Duration::seconds(lifecycle.config.cooldown_secs);
                    if until > now {
                        lifecycle.suppressed_until = Some(until);
                    }
                }
            }
            lifecycle.retired = Some(record);
        }
        lifecycle
    }

    /// The active alert, if any.
    pub fn current(&self) -> Option<&AlertRecord> {
        self.current.as_ref()
    }

    /// Whether reopening is currently suppressed.
    pub fn is_suppressed(&self, now: DateTime<Utc>) -> bool {
        self.suppressed_until.is_some_and(|until| until > now)
    }

    /// End of the active suppression window, if any.
    pub fn suppressed_until(&self) -> Option<DateTime<Utc>> {
        self.suppressed_until
    }

    /// Feed one risk assessment. Emits at most one transition event; no-op
    /// is a valid outcome. Re-delivering an identical assessment is a
    /// no-op.
    pub fn on_assessment(
        &mut self,
        assessment: &RiskAssessment,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let key = AssessmentKey::of(assessment);
        if self.last_seen == Some(key) {
            debug!(patient_id = %assessment.patient_id, "duplicate assessment, ignoring");
            return None;
        }
        self.last_seen = Some(key);

        let risk = assessment.risk_score;

        if self.current.is_some() {
            self.update_active(risk, assessment.timestamp, now)
        } else {
            self.maybe_open(assessment, now)
        }
    }

    /// Periodic sweep: completes a pending auto-resolve dwell and expires
    /// stale suppression windows without waiting for the next sample.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Option<AlertEvent> {
        if self.suppressed_until.is_some_and(|until| until <= now) {
            self.suppressed_until = None;
        }
        if self.dwell_elapsed(now) {
            return self.auto_resolve(now);
        }
        None
    }

    /// Human acknowledgment. Valid only while the alert is open.
    pub fn acknowledge(
        &mut self,
        alert_id: &crate::alert::AlertId,
        by: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertEvent, EngineError> {
        let alert = match self.current.as_mut() {
            Some(alert) if alert.id == *alert_id => alert,
            _ => return Err(self.closed_or_unknown(alert_id, "acknowledge")),
        };
        match alert.state {
            AlertState::Open => {
                alert.state = AlertState::Acknowledged;
                alert.acknowledged_by = Some(by.to_string());
                alert.acknowledged_at = Some(now);
                info!(alert_id = %alert.id, patient_id = %alert.patient_id, by, "alert acknowledged");
                Ok(AlertEvent::Acknowledged {
                    alert: alert.clone(),
                })
            }
            state => Err(EngineError::InvalidTransition {
                alert_id: *alert_id,
                state,
                action: "acknowledge",
            }),
        }
    }

    /// Human dismissal. Valid from open or acknowledged; retires the alert
    /// and starts the cooldown.
    pub fn dismiss(
        &mut self,
        alert_id: &crate::alert::AlertId,
        by: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertEvent, EngineError> {
        let Some(mut alert) = self.current.take() else {
            return Err(self.closed_or_unknown(alert_id, "dismiss"));
        };
        if alert.id != *alert_id {
            self.current = Some(alert);
            return Err(self.closed_or_unknown(alert_id, "dismiss"));
        }
        alert.state = AlertState::Dismissed;
        alert.closed_at = Some(now);
        self.retired = Some(alert.clone());

        let suppressed_until = now + Duration::seconds(self.config.cooldown_secs);
        self.suppressed_until = Some(suppressed_until);
        self.below_close_since = None;

        info!(
            alert_id = %alert.id,
            patient_id = %alert.patient_id,
            by,
            suppressed_until = %suppressed_until,
            "alert dismissed, cooldown started"
        );
        Ok(AlertEvent::Dismissed {
            alert,
            suppressed_until,
        })
    }

    fn maybe_open(&mut self, assessment: &RiskAssessment, now: DateTime<Utc>) -> Option<AlertEvent> {
        if assessment.risk_score < self.config.open_threshold {
            return None;
        }
        if self.is_suppressed(now) {
            debug!(
                patient_id = %assessment.patient_id,
                risk = assessment.risk_score,
                "risk above open threshold but patient in cooldown, suppressing"
            );
            return None;
        }

        let alert = AlertRecord::open(
            assessment.patient_id.clone(),
            assessment.risk_score,
            assessment.timestamp,
        );
        info!(
            alert_id = %alert.id,
            patient_id = %alert.patient_id,
            severity = %alert.severity,
            risk = assessment.risk_score,
            "alert created"
        );
        self.below_close_since = None;
        self.current = Some(alert.clone());
        Some(AlertEvent::Created { alert })
    }

    fn update_active(
        &mut self,
        risk: f64,
        assessed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        {
            // current is Some; checked by the caller.
            let alert = self.current.as_mut()?;
            alert.last_risk_score = risk;
            alert.last_assessment_at = assessed_at;
        }

        if risk < self.config.close_threshold {
            if self.below_close_since.is_none() {
                self.below_close_since = Some(now);
            }
            if self.dwell_elapsed(now) {
                return self.auto_resolve(now);
            }
        } else {
            self.below_close_since = None;
        }

        self.reband_severity(risk)
    }

    /// Re-evaluate the severity band in place. Escalation and
    /// de-escalation do not close or reopen the alert and do not revert an
    /// acknowledgment.
    fn reband_severity(&mut self, risk: f64) -> Option<AlertEvent> {
        let alert = self.current.as_mut()?;
        let new_severity = Severity::from_risk(risk);
        if new_severity == alert.severity {
            return None;
        }
        let previous = alert.severity;
        alert.severity = new_severity;
        if new_severity > previous {
            info!(
                alert_id = %alert.id,
                patient_id = %alert.patient_id,
                %previous,
                severity = %new_severity,
                "alert escalated"
            );
            Some(AlertEvent::Escalated {
                alert: alert.clone(),
                previous,
            })
        } else {
            Some(AlertEvent::Deescalated {
                alert: alert.clone(),
                previous,
            })
        }
    }

    /// Whether an open alert has sat below the close threshold for the
    /// full dwell. Acknowledged alerts never auto-resolve: once a human
    /// owns the alert, only a human closes it.
    fn dwell_elapsed(&self, now: DateTime<Utc>) -> bool {
        let open = matches!(
            self.current.as_ref().map(|a| a.state),
            Some(AlertState::Open)
        );
        open && self.below_close_since.is_some_and(|since| {
            now - since >= Duration::seconds(self.config.resolve_dwell_secs)
        })
    }

    /// Why an admin action found no current alert: the id belongs to a
    /// retired alert (caller gets its terminal state) or was never seen.
    fn closed_or_unknown(&self, alert_id: &crate::alert::AlertId, action: &'static str) -> EngineError {
        match self.retired.as_ref() {
            Some(alert) if alert.id == *alert_id => EngineError::InvalidTransition {
                alert_id: *alert_id,
                state: alert.state,
                action,
            },
            _ => EngineError::UnknownAlert(*alert_id),
        }
    }

    fn auto_resolve(&mut self, now: DateTime<Utc>) -> Option<AlertEvent> {
        let mut alert = self.current.take()?;
        alert.state = AlertState::AutoResolved;
        alert.closed_at = Some(now);
        self.retired = Some(alert.clone());
        self.below_close_since = None;
        info!(
            alert_id = %alert.id,
            patient_id = %alert.patient_id,
            "alert auto-resolved, risk stayed below close threshold"
        );
        Some(AlertEvent::AutoResolved { alert })
    }
}
