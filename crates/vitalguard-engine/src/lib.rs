//! # VitalGuard Engine
//!
//! Stateful runtime around [`vitalguard_core`]: per-patient worker tasks,
//! the alert lifecycle state machine, optional persistence, and event
//! fan-out to subscribers.
//!
//! ## Architecture
//!
//! ```text
//!                        ┌────────────────────────────┐
//!  ingest(raw) ──────────▶  per-patient worker task   │
//!                        │  queue → features → score  │──┐
//!  acknowledge/dismiss ──▶  → lifecycle               │  │ WorkerOutput
//!                        └────────────────────────────┘  ▼
//!                                              ┌──────────────┐
//!       subscribers ◀── broadcast ◀────────────│  dispatcher  │──▶ AlertStore
//!                                              └──────────────┘
//! ```
//!
//! One worker per patient serializes that patient's processing, so the
//! at-most-one-active-alert invariant needs no cross-task locking. The
//! dispatcher updates the alert index and persists before broadcasting,
//! so subscribers always observe a consistent store.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vitalguard_core::RawVitalSample;
//! use vitalguard_engine::Engine;
//!
//! # async fn demo() -> Result<(), vitalguard_engine::EngineError> {
//! let engine = Engine::with_defaults();
//! let mut alerts = engine.subscribe_alerts();
//!
//! engine
//!     .ingest(RawVitalSample {
//!         patient_id: Some("P-001".into()),
//!         timestamp: Some(chrono::Utc::now()),
//!         heart_rate: Some(135.0),
//!         spo2: Some(84.0),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let event = alerts.recv().await.expect("engine running");
//! println!("{} for {}", event.event_type(), event.patient_id());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod alert;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod store;
mod worker;

pub use alert::{AlertId, AlertRecord, AlertState, Severity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::EngineError;
pub use events::AlertEvent;
pub use lifecycle::{AlertLifecycle, LifecycleConfig};
pub use store::{AlertStore, InMemoryAlertStore, StoreError};
pub use worker::SampleQueue;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
