//! Fail-soft operation boundary
//!
//! `SimulationService` is what an HTTP handler or CLI calls. Every operation
//! catches engine errors here, logs them, and degrades to a safe default:
//! mutations return an [`ApiResponse`] carrying a failure status and a
//! generic message, reads return an empty collection. Nothing below this
//! layer is retried and nothing here panics.

use crate::core_types::{
    ActiveAlert, BurningCell, Household, HouseholdId, Incident, IncidentId, IncidentType, Severity,
};
use crate::error::EngineError;
use crate::simulation::{
    HouseholdAssessment, IncidentEngine, IncidentReport, NeighborhoodStatus, RandomSource,
    ReportOutcome, ResetSummary, ResolveSummary,
};
use crate::store::IncidentStore;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::error;

/// Outcome class of a boundary call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    NotFound,
    MissingParameter,
    Failed,
}

impl ResponseStatus {
    /// Matching HTTP status code for a web collaborator
    pub fn http_status(self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::NotFound => 404,
            ResponseStatus::MissingParameter => 400,
            ResponseStatus::Failed => 500,
        }
    }
}

impl From<&EngineError> for ResponseStatus {
    fn from(error: &EngineError) -> Self {
        match error {
            EngineError::NotFound { .. } => ResponseStatus::NotFound,
            EngineError::MissingParameter(_) => ResponseStatus::MissingParameter,
            EngineError::StoreFailure(_) => ResponseStatus::Failed,
        }
    }
}

/// Response envelope for mutating operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

/// Count returned by tick operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub count: usize,
}

/// Report request as received from a client; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportIncidentRequest {
    pub origin_node_id: Option<HouseholdId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub incident_type: Option<IncidentType>,
    pub severity: Option<Severity>,
}

impl ReportIncidentRequest {
    fn into_report(self) -> Result<IncidentReport, EngineError> {
        // An absent origin matches no household, same as an unknown one
        let origin = self
            .origin_node_id
            .ok_or_else(|| EngineError::NotFound {
                entity: "household",
                id: "<none>".to_string(),
            })?;
        let incident_type = self
            .incident_type
            .ok_or(EngineError::MissingParameter("incidentType"))?;
        Ok(IncidentReport {
            origin,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            incident_type,
            severity: self.severity.unwrap_or_default(),
        })
    }
}

/// Resolve request as received from a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIncidentRequest {
    pub incident_id: Option<IncidentId>,
}

/// Engine plus the shared random source for wave ticks
pub struct SimulationService<S> {
    engine: IncidentEngine<S>,
    rng: Mutex<Box<dyn RandomSource + Send>>,
}

impl<S: IncidentStore> SimulationService<S> {
    pub fn new(engine: IncidentEngine<S>, rng: Box<dyn RandomSource + Send>) -> Self {
        Self {
            engine,
            rng: Mutex::new(rng),
        }
    }

    pub fn engine(&self) -> &IncidentEngine<S> {
        &self.engine
    }

    /// Report an incident
    pub fn report_incident(&self, request: ReportIncidentRequest) -> ApiResponse<ReportOutcome> {
        let report = match request.into_report() {
            Ok(report) => report,
            Err(e) => return fail("report incident", &e, "Server error"),
        };
        let message = if report.incident_type == IncidentType::Intrusion {
            "Intrusion alert propagated"
        } else {
            "Incident created"
        };
        match self.engine.report_incident(report) {
            Ok(outcome) => ApiResponse::ok(message, outcome),
            Err(e) => fail("report incident", &e, "Server error"),
        }
    }

    /// Run one escalation tick
    pub fn escalate(&self) -> ApiResponse<TickOutcome> {
        match self.engine.escalate() {
            Ok(count) => ApiResponse::ok("Escalation processed", TickOutcome { count }),
            Err(e) => fail("escalate", &e, "Escalation failed"),
        }
    }

    /// Run one decay propagation tick
    pub fn propagate_risk(&self) -> ApiResponse<TickOutcome> {
        match self.engine.propagate_risk() {
            Ok(0) => ApiResponse::ok("No new cells", TickOutcome { count: 0 }),
            Ok(count) => ApiResponse::ok("Risk propagated", TickOutcome { count }),
            Err(e) => fail("propagate risk", &e, "Propagation failed"),
        }
    }

    /// Run one wave expansion tick with the service's random source
    ///
    /// The generator lock is held for the whole tick, so wave ticks issued
    /// through one service run one after another and each sees the cells the
    /// previous one inserted. Other operations are not serialized against it.
    pub fn propagate_wave(&self) -> ApiResponse<TickOutcome> {
        // A panic mid-draw leaves the generator usable, so poisoning is ignored
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        match self.engine.propagate_wave(&mut **rng) {
            Ok(count) => ApiResponse::ok("Wave expanded", TickOutcome { count }),
            Err(e) => fail("propagate wave", &e, "Propagation failed"),
        }
    }

    /// Resolve the requested incident
    pub fn resolve_incident(&self, request: ResolveIncidentRequest) -> ApiResponse<ResolveSummary> {
        let result = request
            .incident_id
            .ok_or(EngineError::MissingParameter("incidentId"))
            .and_then(|id| self.engine.resolve(id));
        match result {
            Ok(summary) => ApiResponse::ok("Incident resolved successfully", summary),
            Err(e) => fail("resolve incident", &e, "Server error"),
        }
    }

    /// Resolve the newest active incident; succeeds with no data when none is active
    pub fn resolve_latest(&self) -> ApiResponse<ResolveSummary> {
        match self.engine.resolve_latest() {
            Ok(Some(summary)) => ApiResponse::ok("Incident resolved successfully", summary),
            Ok(None) => ApiResponse {
                status: ResponseStatus::Ok,
                message: "No active incidents".to_string(),
                data: None,
            },
            Err(e) => fail("resolve latest incident", &e, "Server error"),
        }
    }

    /// Resolve everything and clear all cells and alerts
    pub fn reset(&self) -> ApiResponse<ResetSummary> {
        match self.engine.reset_all() {
            Ok(summary) => ApiResponse::ok("Simulation reset", summary),
            Err(e) => fail("reset", &e, "Reset failed"),
        }
    }

    pub fn active_incidents(&self) -> Vec<Incident> {
        or_empty("active incidents", self.engine.active_incidents())
    }

    pub fn burning_cells(&self) -> Vec<BurningCell> {
        or_empty("burning cells", self.engine.burning_cells())
    }

    pub fn active_alerts(&self) -> Vec<ActiveAlert> {
        or_empty("active alerts", self.engine.active_alerts())
    }

    pub fn households(&self) -> Vec<Household> {
        or_empty("households", self.engine.households())
    }

    pub fn household_assessments(&self) -> Vec<HouseholdAssessment> {
        or_empty("household assessments", self.engine.assess_households())
    }

    /// Neighborhood summary; reads as safe when the cells cannot be loaded
    pub fn neighborhood_status(&self) -> NeighborhoodStatus {
        self.engine.neighborhood_status().unwrap_or_else(|e| {
            error!(operation = "neighborhood status", "{e}");
            NeighborhoodStatus::Safe
        })
    }
}

fn fail<T>(operation: &'static str, error: &EngineError, generic: &str) -> ApiResponse<T> {
    error!(operation, "{error}");
    let status = ResponseStatus::from(error);
    let message = match status {
        ResponseStatus::NotFound | ResponseStatus::MissingParameter => error.to_string(),
        ResponseStatus::Ok | ResponseStatus::Failed => generic.to_string(),
    };
    ApiResponse::failure(status, message)
}

fn or_empty<T>(operation: &'static str, result: Result<Vec<T>, EngineError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!(operation, "{e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::simulation::ScriptedRandom;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn service() -> SimulationService<InMemoryStore> {
        let store = Arc::new(InMemoryStore::with_households(vec![Household::new(
            "tower-1", 17.4680, 78.3080,
        )]));
        let engine = IncidentEngine::with_system_clock(store, EngineConfig::default());
        SimulationService::new(engine, Box::new(ScriptedRandom::constant(0.0)))
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ResponseStatus::Ok.http_status(), 200);
        assert_eq!(ResponseStatus::NotFound.http_status(), 404);
        assert_eq!(ResponseStatus::MissingParameter.http_status(), 400);
        assert_eq!(ResponseStatus::Failed.http_status(), 500);
    }

    #[test]
    fn test_request_uses_client_field_names() {
        let request: ReportIncidentRequest = serde_json::from_str(
            r#"{"originNodeId":"tower-1","title":"FIRE detected","description":"Simulated sensor event","incidentType":"fire","severity":2}"#,
        )
        .unwrap();
        assert_eq!(request.origin_node_id, Some(HouseholdId::from("tower-1")));
        assert_eq!(request.incident_type, Some(IncidentType::Fire));
        assert_eq!(request.severity, Some(Severity::ELEVATED));

        let resolve: ResolveIncidentRequest = serde_json::from_str(r#"{"incidentId":7}"#).unwrap();
        assert_eq!(resolve.incident_id, Some(IncidentId(7)));
    }

    #[test]
    fn test_missing_parameters() {
        let service = service();
        let response = service.resolve_incident(ResolveIncidentRequest::default());
        assert_eq!(response.status, ResponseStatus::MissingParameter);
        assert!(response.data.is_none());

        let response = service.report_incident(ReportIncidentRequest {
            origin_node_id: Some("tower-1".into()),
            ..ReportIncidentRequest::default()
        });
        assert_eq!(response.status, ResponseStatus::MissingParameter);
        assert!(service.active_incidents().is_empty());
    }

    #[test]
    fn test_absent_origin_is_not_found() {
        let service = service();
        let response = service.report_incident(ReportIncidentRequest {
            incident_type: Some(IncidentType::Fire),
            ..ReportIncidentRequest::default()
        });
        assert_eq!(response.status, ResponseStatus::NotFound);
        assert_eq!(response.status.http_status(), 404);
        assert!(response.data.is_none());
        assert!(service.active_incidents().is_empty());
    }

    #[test]
    fn test_concurrent_wave_ticks_run_in_turn() {
        let service = service();
        let response = service.report_incident(ReportIncidentRequest {
            origin_node_id: Some("tower-1".into()),
            incident_type: Some(IncidentType::Fire),
            severity: Some(Severity::CRITICAL),
            ..ReportIncidentRequest::default()
        });
        assert!(response.is_ok());

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| service.propagate_wave());
            }
        });

        // 1 seed, then 4, then 8; an overlapping pair would have grown 4 + 4
        let cells = service.burning_cells();
        assert_eq!(cells.len(), 13);
        let unique: rustc_hash::FxHashSet<_> = cells.iter().map(|c| c.coord).collect();
        assert_eq!(unique.len(), 13);
    }

    #[test]
    fn test_unknown_origin_is_not_found() {
        let service = service();
        let response = service.report_incident(ReportIncidentRequest {
            origin_node_id: Some("nowhere".into()),
            incident_type: Some(IncidentType::Gas),
            ..ReportIncidentRequest::default()
        });
        assert_eq!(response.status, ResponseStatus::NotFound);
        assert!(service.active_incidents().is_empty());
    }

    #[test]
    fn test_report_then_tick() {
        let service = service();
        let response = service.report_incident(ReportIncidentRequest {
            origin_node_id: Some("tower-1".into()),
            incident_type: Some(IncidentType::Fire),
            severity: Some(Severity::CRITICAL),
            ..ReportIncidentRequest::default()
        });
        assert!(response.is_ok());
        assert_eq!(response.data.unwrap().affected_count, 1);

        let risk = service.propagate_risk();
        assert_eq!(risk.data.unwrap().count, 8);

        let wave = service.propagate_wave();
        assert!(wave.is_ok());
        assert!(!service.neighborhood_status().is_safe());

        let resolved = service.resolve_latest();
        assert!(resolved.is_ok());
        assert!(service.neighborhood_status().is_safe());

        let again = service.resolve_latest();
        assert!(again.is_ok());
        assert!(again.data.is_none());
    }

    #[test]
    fn test_response_json_omits_missing_data() {
        let response: ApiResponse<TickOutcome> =
            ApiResponse::failure(ResponseStatus::Failed, "Propagation failed");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("data").is_none());
    }
}
