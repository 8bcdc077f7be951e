//! Error types for the alert engine.

use thiserror::Error;

use vitalguard_core::{PatientId, ValidationError};

use crate::alert::{AlertId, AlertState};

/// Errors surfaced by engine operations.
///
/// Everything here is recoverable by the caller; no engine error tears
/// down a patient worker, let alone the process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An acknowledge/dismiss action targeted an alert whose state does not
    /// permit it. State is unchanged.
    #[error("alert {alert_id} is {state:?}, cannot {action}")]
    InvalidTransition {
        /// Target alert.
        alert_id: AlertId,
        /// State the alert was found in.
        state: AlertState,
        /// The rejected action.
        action: &'static str,
    },

    /// No live alert with this id is known to the engine.
    #[error("unknown alert {0}")]
    UnknownAlert(AlertId),

    /// The patient has no admitted worker.
    #[error("patient {0} is not admitted")]
    UnknownPatient(PatientId),

    /// The incoming sample was rejected by validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine (or the target worker) is shutting down.
    #[error("engine is shutting down")]
    Shutdown,
}
