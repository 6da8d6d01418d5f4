//! Incident lifecycle: report, escalate, resolve, reset

use super::IncidentEngine;
use crate::config::EscalationConfig;
use crate::core_types::{
    BurningCell, HouseholdId, IncidentId, IncidentPatch, IncidentStatus, IncidentType, NewIncident,
    Severity,
};
use crate::error::EngineError;
use crate::store::IncidentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A new incident as reported by a sensor or operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub origin: HouseholdId,
    pub title: String,
    pub description: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
}

/// Result of reporting an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub incident_id: IncidentId,
    /// Households alerted for intrusions, otherwise the single seeded cell
    pub affected_count: usize,
}

/// Result of resolving one incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSummary {
    pub incident_id: IncidentId,
    pub cells_deleted: usize,
}

/// Result of a full reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub incidents_resolved: usize,
    pub alerts_deleted: usize,
    pub cells_deleted: usize,
}

/// Severity after one escalation check
///
/// The critical branch is evaluated first and the elevated branch only when
/// the critical condition fails, so a level 1 incident older than the
/// critical threshold jumps straight to 3. Both comparisons are strict.
pub fn escalated_severity(
    current: Severity,
    elapsed_minutes: f64,
    config: &EscalationConfig,
) -> Severity {
    if elapsed_minutes > config.critical_after_minutes && current < Severity::CRITICAL {
        Severity::CRITICAL
    } else if elapsed_minutes > config.elevated_after_minutes && current < Severity::ELEVATED {
        Severity::ELEVATED
    } else {
        current
    }
}

fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Record a new active incident and seed its initial state
    ///
    /// Intrusions fan out alerts to nearby households and never touch the
    /// grid. Every other type seeds exactly one decaying cell at the origin's
    /// grid cell using the severity profile.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] if the origin household is unknown,
    /// or [`EngineError::StoreFailure`] if a store call fails.
    pub fn report_incident(&self, report: IncidentReport) -> Result<ReportOutcome, EngineError> {
        let origin = self
            .store
            .household(&report.origin)?
            .ok_or_else(|| EngineError::household_not_found(&report.origin))?;

        let incident_type = report.incident_type;
        let severity = report.severity;
        let incident = self.store.insert_incident(NewIncident {
            origin: report.origin,
            title: report.title,
            description: report.description,
            incident_type,
            severity,
            status: IncidentStatus::Active,
            started_at: self.clock.now(),
        })?;

        info!(
            incident_id = %incident.id,
            incident_type = %incident_type,
            severity = %severity,
            origin = %origin.id,
            "incident reported"
        );

        if incident_type == IncidentType::Intrusion {
            let affected_count = self.fan_out_alerts(incident.id, &origin)?;
            return Ok(ReportOutcome {
                incident_id: incident.id,
                affected_count,
            });
        }

        if !severity.is_recognized() {
            warn!(
                incident_id = %incident.id,
                severity = %severity,
                "unrecognized severity, seeding with the level 1 profile"
            );
        }
        let profile = self.config.severity.profile(severity);
        let coord = self.mapper.to_grid(origin.location());
        self.store.insert_cells(vec![BurningCell::decaying(
            incident.id,
            coord,
            profile.risk_level,
            profile.decay_factor,
        )])?;
        debug!(
            incident_id = %incident.id,
            cell_x = coord.x,
            cell_y = coord.y,
            risk_level = profile.risk_level,
            "seeded origin cell"
        );

        Ok(ReportOutcome {
            incident_id: incident.id,
            affected_count: 1,
        })
    }

    /// Raise the severity of active incidents by elapsed time
    ///
    /// Intrusions never escalate. Only incidents whose severity actually
    /// changes are written. A failed write is logged and skipped; the rest of
    /// the batch still runs. Returns the number of incidents escalated.
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] only if the active incidents
    /// cannot be read.
    pub fn escalate(&self) -> Result<usize, EngineError> {
        let incidents = self.store.incidents_with_status(IncidentStatus::Active)?;
        let now = self.clock.now();
        let mut escalated = 0;

        for incident in &incidents {
            if incident.incident_type == IncidentType::Intrusion {
                continue;
            }

            let elapsed = minutes_between(incident.started_at, now);
            let next = escalated_severity(incident.severity, elapsed, &self.config.escalation);
            if next == incident.severity {
                continue;
            }

            match self
                .store
                .update_incident(incident.id, &IncidentPatch::severity(next))
            {
                Ok(()) => {
                    escalated += 1;
                    debug!(
                        incident_id = %incident.id,
                        from = %incident.severity,
                        to = %next,
                        elapsed_minutes = elapsed,
                        "incident escalated"
                    );
                }
                Err(e) => warn!(incident_id = %incident.id, "escalation update failed: {e}"),
            }
        }

        Ok(escalated)
    }

    /// Mark one incident resolved and delete its cells
    ///
    /// Alerts are left in place; they drop out of the active views through
    /// the incident's status.
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if a store call fails.
    pub fn resolve(&self, incident_id: IncidentId) -> Result<ResolveSummary, EngineError> {
        self.store.update_incident(
            incident_id,
            &IncidentPatch::resolved(Some(self.clock.now())),
        )?;
        let cells_deleted = self.store.delete_cells_for_incident(incident_id)?;

        info!(incident_id = %incident_id, cells_deleted, "incident resolved");
        Ok(ResolveSummary {
            incident_id,
            cells_deleted,
        })
    }

    /// Resolve the most recently reported active incident, if any
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if a store call fails.
    pub fn resolve_latest(&self) -> Result<Option<ResolveSummary>, EngineError> {
        let newest = self
            .store
            .incidents_with_status_newest_first(IncidentStatus::Active)?;
        match newest.first() {
            Some(incident) => self.resolve(incident.id).map(Some),
            None => {
                debug!("no active incident to resolve");
                Ok(None)
            }
        }
    }

    /// Wipe the whole simulation
    ///
    /// Every active incident is marked resolved (status only, no resolution
    /// time), and all alerts and all cells are deleted regardless of owner.
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] on the first failing store call.
    pub fn reset_all(&self) -> Result<ResetSummary, EngineError> {
        let active = self.store.incidents_with_status(IncidentStatus::Active)?;
        let patch = IncidentPatch::resolved(None);
        for incident in &active {
            self.store.update_incident(incident.id, &patch)?;
        }

        let summary = ResetSummary {
            incidents_resolved: active.len(),
            alerts_deleted: self.store.delete_all_alerts()?,
            cells_deleted: self.store.delete_all_cells()?,
        };

        info!(
            incidents_resolved = summary.incidents_resolved,
            alerts_deleted = summary.alerts_deleted,
            cells_deleted = summary.cells_deleted,
            "simulation reset"
        );
        Ok(summary)
    }
}
