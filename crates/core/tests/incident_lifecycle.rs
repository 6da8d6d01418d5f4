//! Integration tests for reporting, escalating, resolving and resetting incidents
//!
//! Every test drives the engine against the in-memory store with a manual
//! clock, so elapsed-time escalation is exact.

use chrono::{DateTime, Duration, TimeZone, Utc};
use incident_sim_core::core_types::IncidentPatch;
use incident_sim_core::grid::METERS_PER_DEGREE_LAT;
use incident_sim_core::simulation::IncidentReport;
use incident_sim_core::{
    CellState, EngineConfig, EngineError, Household, HouseholdId, IncidentEngine, IncidentId,
    IncidentStatus, IncidentStore, IncidentType, InMemoryStore, ManualClock, NeighborhoodStatus,
    Severity,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    engine: IncidentEngine<InMemoryStore>,
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn origin() -> Household {
    Household::new("origin", 17.4680, 78.3080)
}

fn north_of(id: &str, meters: f64) -> Household {
    let origin = origin();
    Household::new(
        id,
        origin.latitude + meters / METERS_PER_DEGREE_LAT,
        origin.longitude,
    )
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::with_households(vec![
        origin(),
        north_of("near", 50.0),
        north_of("far", 500.0),
    ]));
    let clock = Arc::new(ManualClock::new(start_time()));
    let engine = IncidentEngine::new(store.clone(), clock.clone(), EngineConfig::default());
    Fixture {
        engine,
        store,
        clock,
    }
}

fn report(origin: &str, incident_type: IncidentType, severity: u8) -> IncidentReport {
    IncidentReport {
        origin: origin.into(),
        title: format!("{} detected", incident_type.as_str().to_uppercase()),
        description: "Simulated sensor event".to_string(),
        incident_type,
        severity: Severity(severity),
    }
}

fn severity_of(fx: &Fixture, id: IncidentId) -> u8 {
    fx.store
        .incident(id)
        .unwrap()
        .expect("incident exists")
        .severity
        .level()
}

#[test]
fn test_fire_report_seeds_origin_cell() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();
    assert_eq!(outcome.affected_count, 1);

    let incident = fx.store.incident(outcome.incident_id).unwrap().unwrap();
    assert_eq!(incident.status, IncidentStatus::Active);
    assert_eq!(incident.started_at, start_time());
    assert_eq!(incident.resolved_at, None);
    assert_eq!(incident.origin, HouseholdId::from("origin"));

    let cells = fx.engine.burning_cells().unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].incident_id, outcome.incident_id);
    assert_eq!(cells[0].coord, fx.engine.mapper().to_grid(origin().location()));
    assert_eq!(
        cells[0].state,
        CellState::Decaying {
            risk_level: 40.0,
            decay_factor: 0.6
        }
    );
    assert!(fx.engine.active_alerts().unwrap().is_empty());
}

#[test]
fn test_critical_gas_report_uses_critical_profile() {
    let fx = fixture();
    fx.engine
        .report_incident(report("origin", IncidentType::Gas, 3))
        .unwrap();

    let cells = fx.engine.burning_cells().unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].state.risk_level(), Some(100.0));
    assert_eq!(cells[0].state.decay_factor(), Some(0.85));
}

#[test]
fn test_unknown_severity_seeds_like_level_one() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 7))
        .unwrap();

    // Stored as given
    assert_eq!(severity_of(&fx, outcome.incident_id), 7);
    let cells = fx.engine.burning_cells().unwrap();
    assert_eq!(cells[0].state.risk_level(), Some(40.0));
    assert_eq!(cells[0].state.decay_factor(), Some(0.6));
}

#[test]
fn test_intrusion_report_alerts_neighbors_without_cells() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Intrusion, 1))
        .unwrap();
    assert_eq!(outcome.affected_count, 2);
    assert!(fx.engine.burning_cells().unwrap().is_empty());

    let alerts = fx
        .engine
        .alerts_for_incidents(&[outcome.incident_id])
        .unwrap();
    assert_eq!(alerts.len(), 2);
    let origin_alert = alerts
        .iter()
        .find(|a| a.household_id == HouseholdId::from("origin"))
        .expect("origin alerted");
    assert!(origin_alert.confirmed);
    let near_alert = alerts
        .iter()
        .find(|a| a.household_id == HouseholdId::from("near"))
        .expect("near alerted");
    assert!(!near_alert.confirmed);
    assert!(alerts
        .iter()
        .all(|a| a.household_id != HouseholdId::from("far")));

    let active = fx.engine.active_alerts().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active
        .iter()
        .all(|a| a.incident_type == IncidentType::Intrusion && a.status == IncidentStatus::Active));
}

#[test]
fn test_unknown_origin_is_rejected_before_anything_is_written() {
    let fx = fixture();
    let err = fx
        .engine
        .report_incident(report("nowhere", IncidentType::Fire, 1))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "household", .. }));
    assert!(fx.store.all_incidents().unwrap().is_empty());
    assert!(fx.engine.burning_cells().unwrap().is_empty());
}

#[test]
fn test_alert_intrusion_directly() {
    let fx = fixture();
    let err = fx
        .engine
        .alert_intrusion(IncidentId(99), &HouseholdId::from("far"))
        .unwrap_err();
    // No incident 99 exists, so the store refuses the alert rows
    assert!(matches!(err, EngineError::StoreFailure(_)));

    let outcome = fx
        .engine
        .report_incident(report("far", IncidentType::Intrusion, 1))
        .unwrap();
    // "far" is alone within its radius
    assert_eq!(outcome.affected_count, 1);

    let err = fx
        .engine
        .alert_intrusion(outcome.incident_id, &HouseholdId::from("ghost"))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[test]
fn test_escalation_after_125_seconds_jumps_to_critical() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();

    fx.clock.advance(Duration::seconds(125));
    assert_eq!(fx.engine.escalate().unwrap(), 1);
    assert_eq!(severity_of(&fx, outcome.incident_id), 3);

    // Nothing left to raise
    assert_eq!(fx.engine.escalate().unwrap(), 0);
}

#[test]
fn test_escalation_steps_through_elevated() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Gas, 1))
        .unwrap();

    fx.clock.advance(Duration::seconds(60));
    assert_eq!(fx.engine.escalate().unwrap(), 0);
    assert_eq!(severity_of(&fx, outcome.incident_id), 1);

    fx.clock.advance(Duration::seconds(30));
    assert_eq!(fx.engine.escalate().unwrap(), 1);
    assert_eq!(severity_of(&fx, outcome.incident_id), 2);

    fx.clock.advance(Duration::seconds(31));
    assert_eq!(fx.engine.escalate().unwrap(), 1);
    assert_eq!(severity_of(&fx, outcome.incident_id), 3);
}

#[test]
fn test_intrusions_and_resolved_incidents_never_escalate() {
    let fx = fixture();
    let intrusion = fx
        .engine
        .report_incident(report("origin", IncidentType::Intrusion, 1))
        .unwrap();
    let fire = fx
        .engine
        .report_incident(report("far", IncidentType::Fire, 1))
        .unwrap();
    fx.engine.resolve(fire.incident_id).unwrap();

    fx.clock.advance(Duration::minutes(10));
    assert_eq!(fx.engine.escalate().unwrap(), 0);
    assert_eq!(severity_of(&fx, intrusion.incident_id), 1);
    assert_eq!(severity_of(&fx, fire.incident_id), 1);
}

#[test]
fn test_escalation_does_not_touch_seeded_cells() {
    let fx = fixture();
    fx.engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();
    fx.clock.advance(Duration::minutes(5));
    fx.engine.escalate().unwrap();

    let cells = fx.engine.burning_cells().unwrap();
    assert_eq!(cells[0].state.risk_level(), Some(40.0));
}

#[test]
fn test_resolve_deletes_only_that_incidents_cells() {
    let fx = fixture();
    let a = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();
    let b = fx
        .engine
        .report_incident(report("far", IncidentType::Fire, 1))
        .unwrap();
    // 8 children per seed
    assert_eq!(fx.engine.propagate_risk().unwrap(), 16);

    fx.clock.advance(Duration::seconds(10));
    let summary = fx.engine.resolve(a.incident_id).unwrap();
    assert_eq!(summary.incident_id, a.incident_id);
    assert_eq!(summary.cells_deleted, 9);

    let remaining = fx.engine.burning_cells().unwrap();
    assert_eq!(remaining.len(), 9);
    assert!(remaining.iter().all(|c| c.incident_id == b.incident_id));

    let resolved = fx.store.incident(a.incident_id).unwrap().unwrap();
    assert_eq!(resolved.status, IncidentStatus::Resolved);
    assert_eq!(
        resolved.resolved_at,
        Some(start_time() + Duration::seconds(10))
    );
    assert_eq!(fx.engine.active_incidents().unwrap().len(), 1);
}

#[test]
fn test_resolve_keeps_alert_rows_but_hides_them() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Intrusion, 1))
        .unwrap();
    fx.engine.resolve(outcome.incident_id).unwrap();

    assert_eq!(fx.store.all_alerts().unwrap().len(), 2);
    assert!(fx.engine.active_alerts().unwrap().is_empty());
}

#[test]
fn test_resolve_unknown_incident_is_a_no_op() {
    let fx = fixture();
    let summary = fx.engine.resolve(IncidentId(404)).unwrap();
    assert_eq!(summary.cells_deleted, 0);
    assert!(fx.store.all_incidents().unwrap().is_empty());
}

#[test]
fn test_resolve_latest_picks_newest_active() {
    let fx = fixture();
    assert_eq!(fx.engine.resolve_latest().unwrap(), None);

    let older = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();
    fx.clock.advance(Duration::seconds(5));
    let newer = fx
        .engine
        .report_incident(report("far", IncidentType::Gas, 1))
        .unwrap();

    let active = fx.engine.active_incidents().unwrap();
    assert_eq!(active[0].id, newer.incident_id);
    assert_eq!(active[1].id, older.incident_id);

    let summary = fx.engine.resolve_latest().unwrap().expect("one resolved");
    assert_eq!(summary.incident_id, newer.incident_id);
    let summary = fx.engine.resolve_latest().unwrap().expect("one resolved");
    assert_eq!(summary.incident_id, older.incident_id);
    assert_eq!(fx.engine.resolve_latest().unwrap(), None);
}

#[test]
fn test_reset_wipes_everything_without_resolution_time() {
    let fx = fixture();
    fx.engine
        .report_incident(report("origin", IncidentType::Fire, 3))
        .unwrap();
    fx.engine
        .report_incident(report("far", IncidentType::Intrusion, 1))
        .unwrap();
    fx.engine.propagate_risk().unwrap();
    assert!(!fx.engine.neighborhood_status().unwrap().is_safe());

    let summary = fx.engine.reset_all().unwrap();
    assert_eq!(summary.incidents_resolved, 2);
    assert_eq!(summary.alerts_deleted, 1);
    assert_eq!(summary.cells_deleted, 9);

    assert!(fx.engine.burning_cells().unwrap().is_empty());
    assert!(fx.store.all_alerts().unwrap().is_empty());
    assert!(fx.engine.active_incidents().unwrap().is_empty());
    for incident in fx.store.all_incidents().unwrap() {
        assert_eq!(incident.status, IncidentStatus::Resolved);
        assert_eq!(incident.resolved_at, None);
    }
    assert_eq!(
        fx.engine.neighborhood_status().unwrap(),
        NeighborhoodStatus::Safe
    );
}

#[test]
fn test_reset_also_clears_cells_of_already_resolved_incidents() {
    let fx = fixture();
    let outcome = fx
        .engine
        .report_incident(report("origin", IncidentType::Fire, 1))
        .unwrap();
    // Status-only resolve leaves the seeded cell behind
    fx.store
        .update_incident(outcome.incident_id, &IncidentPatch::resolved(None))
        .unwrap();
    assert_eq!(fx.engine.burning_cells().unwrap().len(), 1);

    let summary = fx.engine.reset_all().unwrap();
    assert_eq!(summary.incidents_resolved, 0);
    assert_eq!(summary.cells_deleted, 1);
}
