//! End-to-end flows through the engine: ingest to alert, admin actions,
//! discharge, and persistence across restarts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use vitalguard_core::{PatientId, RawVitalSample};
use vitalguard_engine::{
    AlertRecord, AlertState, Engine, EngineError, InMemoryAlertStore, Severity,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_TIMEOUT: Duration = Duration::from_millis(300);

/// Route engine tracing through the test harness; `RUST_LOG` filters it.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn critical_panel(patient: &str) -> RawVitalSample {
    RawVitalSample {
        patient_id: Some(patient.to_string()),
        timestamp: Some(Utc::now()),
        heart_rate: Some(145.0),
        bp_systolic: Some(220.0),
        respiratory_rate: Some(35.0),
        temperature: Some(39.8),
        spo2: Some(82.0),
        ..Default::default()
    }
}

fn normal_panel(patient: &str) -> RawVitalSample {
    RawVitalSample {
        patient_id: Some(patient.to_string()),
        timestamp: Some(Utc::now()),
        heart_rate: Some(72.0),
        bp_systolic: Some(120.0),
        respiratory_rate: Some(16.0),
        temperature: Some(37.0),
        spo2: Some(98.0),
        ..Default::default()
    }
}

#[tokio::test]
async fn critical_vitals_raise_a_critical_alert() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut assessments = engine.subscribe_assessments();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-1")).await.unwrap();

    let assessment = timeout(RECV_TIMEOUT, assessments.recv())
        .await
        .expect("assessment within timeout")
        .unwrap();
    assert!(assessment.ews_score >= 12);
    assert!(assessment.risk_score >= 0.8);
    assert!(!assessment.contributing_factors.is_empty());

    let event = timeout(RECV_TIMEOUT, alerts.recv())
        .await
        .expect("alert within timeout")
        .unwrap();
    assert_eq!(event.event_type(), "created");
    assert_eq!(event.alert().severity, Severity::Critical);
    assert_eq!(event.patient_id().as_str(), "P-1");
}

#[tokio::test]
async fn normal_vitals_never_alert() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut assessments = engine.subscribe_assessments();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(normal_panel("P-2")).await.unwrap();

    let assessment = timeout(RECV_TIMEOUT, assessments.recv())
        .await
        .expect("assessment within timeout")
        .unwrap();
    assert_eq!(assessment.ews_score, 0);

    assert!(timeout(QUIET_TIMEOUT, alerts.recv()).await.is_err());
}

#[tokio::test]
async fn empty_vital_panel_scores_the_floor_and_never_alerts() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut assessments = engine.subscribe_assessments();
    let mut alerts = engine.subscribe_alerts();

    // Valid envelope, zero readings.
    engine
        .ingest(RawVitalSample {
            patient_id: Some("P-10".to_string()),
            timestamp: Some(Utc::now()),
            ..Default::default()
        })
        .await
        .unwrap();

    let assessment = timeout(RECV_TIMEOUT, assessments.recv())
        .await
        .expect("assessment within timeout")
        .unwrap();
    assert_eq!(assessment.ews_score, 0);
    assert!((assessment.risk_score - 0.1).abs() < f64::EPSILON);
    assert!(assessment.confidence.abs() < f64::EPSILON);

    assert!(timeout(QUIET_TIMEOUT, alerts.recv()).await.is_err());
}

#[tokio::test]
async fn acknowledge_and_dismiss_round_trip() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-3")).await.unwrap();
    let created = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    let alert_id = created.alert().id;

    let acked = engine.acknowledge(&alert_id, "dr.osei").await.unwrap();
    assert_eq!(acked.alert().state, AlertState::Acknowledged);
    assert_eq!(acked.alert().acknowledged_by.as_deref(), Some("dr.osei"));

    // The broadcast mirrors the reply.
    let broadcast = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    assert_eq!(broadcast.event_type(), "acknowledged");

    let dismissed = engine.dismiss(&alert_id, "dr.osei").await.unwrap();
    assert_eq!(dismissed.alert().state, AlertState::Dismissed);

    let broadcast = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    assert_eq!(broadcast.event_type(), "dismissed");

    // Dismissal retires the id; further admin actions report the closed
    // state rather than an unknown alert.
    assert!(matches!(
        engine.acknowledge(&alert_id, "dr.osei").await,
        Err(EngineError::InvalidTransition {
            state: AlertState::Dismissed,
            ..
        })
    ));
}

#[tokio::test]
async fn dismissal_cooldown_suppresses_reopen() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-4")).await.unwrap();
    let created = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    engine.dismiss(&created.alert().id, "nurse").await.unwrap();
    let _ = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();

    // Risk is still critical, but the one-hour cooldown holds.
    engine.ingest(critical_panel("P-4")).await.unwrap();
    assert!(timeout(QUIET_TIMEOUT, alerts.recv()).await.is_err());
}

#[tokio::test]
async fn discharge_tears_the_worker_down() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-5")).await.unwrap();
    let created = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();

    let final_alert = engine.discharge(&PatientId::new("P-5")).await.unwrap();
    assert_eq!(final_alert.unwrap().id, created.alert().id);
    assert_eq!(engine.patient_count().await, 0);

    // Second discharge and stale admin actions both fail cleanly.
    assert!(matches!(
        engine.discharge(&PatientId::new("P-5")).await,
        Err(EngineError::UnknownPatient(_))
    ));
    assert!(matches!(
        engine.acknowledge(&created.alert().id, "dr").await,
        Err(EngineError::UnknownAlert(_))
    ));
}

#[tokio::test]
async fn alerts_write_through_to_the_store() {
    init_tracing();
    let store = Arc::new(InMemoryAlertStore::new());
    let engine = Engine::builder().store(store.clone()).build();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-6")).await.unwrap();
    // The dispatcher persists before broadcasting, so once the event
    // arrives the record is already durable.
    let created = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();

    let persisted = store.get(&PatientId::new("P-6")).unwrap();
    assert_eq!(persisted.id, created.alert().id);
    assert_eq!(persisted.state, AlertState::Open);

    engine.dismiss(&created.alert().id, "nurse").await.unwrap();
    let _ = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    let persisted = store.get(&PatientId::new("P-6")).unwrap();
    assert_eq!(persisted.state, AlertState::Dismissed);
}

#[tokio::test]
async fn restart_restores_the_open_alert_instead_of_duplicating() {
    init_tracing();
    let store = Arc::new(InMemoryAlertStore::new());
    let restored = AlertRecord::open(PatientId::new("P-7"), 0.65, Utc::now());
    assert_eq!(restored.severity, Severity::High);
    store.insert(restored.clone());

    let engine = Engine::builder().store(store.clone()).build();
    let mut alerts = engine.subscribe_alerts();

    // First sample after "restart" is critical: the restored alert
    // escalates in place rather than a second one opening.
    engine.ingest(critical_panel("P-7")).await.unwrap();
    let event = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    assert_eq!(event.event_type(), "escalated");
    assert_eq!(event.alert().id, restored.id);
    assert_eq!(event.alert().severity, Severity::Critical);

    // The restored id remains addressable by admin actions.
    engine.acknowledge(&restored.id, "dr.kim").await.unwrap();
}

#[tokio::test]
async fn patients_are_isolated_from_each_other() {
    init_tracing();
    let engine = Engine::with_defaults();
    let mut alerts = engine.subscribe_alerts();

    engine.ingest(critical_panel("P-8")).await.unwrap();
    engine.ingest(normal_panel("P-9")).await.unwrap();

    let event = timeout(RECV_TIMEOUT, alerts.recv()).await.unwrap().unwrap();
    assert_eq!(event.patient_id().as_str(), "P-8");
    assert_eq!(engine.patient_count().await, 2);

    // Only the alerting patient's worker holds an alert.
    assert!(timeout(QUIET_TIMEOUT, alerts.recv()).await.is_err());
}
