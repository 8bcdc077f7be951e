//! Alert records and severity bands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitalguard_core::PatientId;

/// Unique identifier for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Create a new random alert ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert severity derived from risk score bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Risk below 0.4.
    Low,
    /// Risk in [0.4, 0.6).
    Medium,
    /// Risk in [0.6, 0.8).
    High,
    /// Risk at or above 0.8.
    Critical,
}

impl Severity {
    /// Band a risk score into a severity.
    pub fn from_risk(risk: f64) -> Self {
        if risk >= 0.8 {
            Severity::Critical
        } else if risk >= 0.6 {
            Severity::High
        } else if risk >= 0.4 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Actionable and unreviewed.
    Open,
    /// Human-reviewed but still active; severity may still re-escalate.
    Acknowledged,
    /// Explicitly dismissed; retired, starts a cooldown.
    Dismissed,
    /// Risk stayed below the close threshold for the dwell; retired.
    AutoResolved,
}

impl AlertState {
    /// Whether this is a terminal state. A retired alert never transitions
    /// again; the patient returns to having no alert.
    pub fn is_retired(&self) -> bool {
        matches!(self, AlertState::Dismissed | AlertState::AutoResolved)
    }
}

/// A deterioration alert for one patient.
///
/// Invariant (held by the lifecycle): at most one non-retired record exists
/// per patient at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Unique alert id.
    pub id: AlertId,
    /// Owning patient.
    pub patient_id: PatientId,
    /// Current severity band; re-evaluated on every assessment while
    /// active.
    pub severity: Severity,
    /// Current lifecycle state.
    pub state: AlertState,
    /// When the alert opened.
    pub opened_at: DateTime<Utc>,
    /// Risk score of the most recent assessment.
    pub last_risk_score: f64,
    /// Timestamp of the most recent assessment.
    pub last_assessment_at: DateTime<Utc>,
    /// Who acknowledged, if anyone.
    pub acknowledged_by: Option<String>,
    /// When acknowledged, if ever.
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// When the alert retired (dismissal or auto-resolution).
    pub closed_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    /// Open a fresh alert from an assessment.
    pub fn open(patient_id: PatientId, risk: f64, at: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::new(),
            patient_id,
            severity: Severity::from_risk(risk),
            state: AlertState::Open,
            opened_at: at,
            last_risk_score: risk,
            last_assessment_at: at,
            acknowledged_by: None,
            acknowledged_at: None,
            closed_at: None,
        }
    }

    /// Whether the alert is still active (open or acknowledged).
    pub fn is_active(&self) -> bool {
        !self.state.is_retired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bands_both_sides() {
        assert_eq!(Severity::from_risk(0.39), Severity::Low);
        assert_eq!(Severity::from_risk(0.4), Severity::Medium);
        assert_eq!(Severity::from_risk(0.59), Severity::Medium);
        assert_eq!(Severity::from_risk(0.6), Severity::High);
        assert_eq!(Severity::from_risk(0.79), Severity::High);
        assert_eq!(Severity::from_risk(0.8), Severity::Critical);
        assert_eq!(Severity::from_risk(1.0), Severity::Critical);
    }

    #[test]
    fn severity_ordering_supports_escalation_checks() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn retired_states() {
        assert!(!AlertState::Open.is_retired());
        assert!(!AlertState::Acknowledged.is_retired());
        assert!(AlertState::Dismissed.is_retired());
        assert!(AlertState::AutoResolved.is_retired());
    }

    #[test]
    fn fresh_alert_is_open_with_banded_severity() {
        let alert = AlertRecord::open("P-1".into(), 0.85, Utc::now());
        assert_eq!(alert.state, AlertState::Open);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.is_active());
        assert!(alert.acknowledged_by.is_none());
    }
}
