//! Alert lifecycle events emitted on every state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitalguard_core::PatientId;

use crate::alert::{AlertRecord, Severity};

/// An alert state transition, published for notification, UI, and
/// persistence layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertEvent {
    /// A new alert opened.
    Created {
        /// The alert as opened.
        alert: AlertRecord,
    },
    /// Severity moved up while the alert stayed active.
    Escalated {
        /// The alert after escalation.
        alert: AlertRecord,
        /// Severity before this assessment.
        previous: Severity,
    },
    /// Severity moved down while the alert stayed active.
    Deescalated {
        /// The alert after de-escalation.
        alert: AlertRecord,
        /// Severity before this assessment.
        previous: Severity,
    },
    /// A human reviewed the alert.
    Acknowledged {
        /// The acknowledged alert.
        alert: AlertRecord,
    },
    /// A human dismissed the alert; reopening is suppressed until the
    /// cooldown expires.
    Dismissed {
        /// The dismissed (retired) alert.
        alert: AlertRecord,
        /// End of the reopen-suppression window.
        suppressed_until: DateTime<Utc>,
    },
    /// Risk stayed below the close threshold for the dwell period and the
    /// alert closed without human action.
    AutoResolved {
        /// The auto-resolved (retired) alert.
        alert: AlertRecord,
    },
}

impl AlertEvent {
    /// The alert this event concerns.
    pub fn alert(&self) -> &AlertRecord {
        match self {
            AlertEvent::Created { alert }
            | AlertEvent::Escalated { alert, .. }
            | AlertEvent::Deescalated { alert, .. }
            | AlertEvent::Acknowledged { alert }
            | AlertEvent::Dismissed { alert, .. }
            | AlertEvent::AutoResolved { alert } => alert,
        }
    }

    /// The patient this event concerns.
    pub fn patient_id(&self) -> &PatientId {
        &self.alert().patient_id
    }

    /// Stable event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            AlertEvent::Created { .. } => "created",
            AlertEvent::Escalated { .. } => "escalated",
            AlertEvent::Deescalated { .. } => "deescalated",
            AlertEvent::Acknowledged { .. } => "acknowledged",
            AlertEvent::Dismissed { .. } => "dismissed",
            AlertEvent::AutoResolved { .. } => "auto_resolved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn event_type_names_are_stable() {
        let alert = AlertRecord::open("P-1".into(), 0.7, Utc::now());
        let ev = AlertEvent::Created {
            alert: alert.clone(),
        };
        assert_eq!(ev.event_type(), "created");
        assert_eq!(ev.patient_id().as_str(), "P-1");

        let ev = AlertEvent::AutoResolved { alert };
        assert_eq!(ev.event_type(), "auto_resolved");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let alert = AlertRecord::open("P-1".into(), 0.7, Utc::now());
        let json = serde_json::to_string(&AlertEvent::Created { alert }).unwrap();
        assert!(json.contains("\"type\":\"created\""));
    }
}
