//! In-process store backed by lock-guarded vectors
//!
//! Each collection has its own `RwLock`, so reads of one collection never
//! block writes to another. Nothing is held across calls.

use super::{IncidentStore, StoreError};
use crate::core_types::{
    ActiveAlert, Alert, BurningCell, Household, HouseholdId, Incident, IncidentId, IncidentPatch,
    IncidentStatus, NewIncident,
};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Thread-safe store for tests, demos and single-process deployments
#[derive(Debug)]
pub struct InMemoryStore {
    incidents: RwLock<Vec<Incident>>,
    next_incident_id: AtomicU64,
    cells: RwLock<Vec<BurningCell>>,
    alerts: RwLock<Vec<Alert>>,
    households: RwLock<Vec<Household>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<'a, T>(
    lock: &'a RwLock<T>,
    collection: &'static str,
) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::LockPoisoned { collection })
}

fn write<'a, T>(
    lock: &'a RwLock<T>,
    collection: &'static str,
) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::LockPoisoned { collection })
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            incidents: RwLock::new(Vec::new()),
            next_incident_id: AtomicU64::new(1),
            cells: RwLock::new(Vec::new()),
            alerts: RwLock::new(Vec::new()),
            households: RwLock::new(Vec::new()),
        }
    }

    /// Create a store whose household registry holds `households`
    pub fn with_households(households: Vec<Household>) -> Self {
        Self {
            households: RwLock::new(households),
            ..Self::new()
        }
    }

    /// Register a household. The engine never calls this; it stands in for
    /// the external registry.
    ///
    /// # Errors
    /// Returns [`StoreError::Rejected`] for a duplicate id.
    pub fn add_household(&self, household: Household) -> Result<(), StoreError> {
        let mut households = write(&self.households, "households")?;
        if households.iter().any(|h| h.id == household.id) {
            return Err(StoreError::Rejected(format!(
                "household `{}` already exists",
                household.id
            )));
        }
        households.push(household);
        Ok(())
    }

    /// Look up an incident by id (any status)
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection lock is poisoned.
    pub fn incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError> {
        let incidents = read(&self.incidents, "incidents")?;
        Ok(incidents.iter().find(|i| i.id == id).cloned())
    }

    /// Every incident in insertion order
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection lock is poisoned.
    pub fn all_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        Ok(read(&self.incidents, "incidents")?.clone())
    }

    /// Every alert row
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection lock is poisoned.
    pub fn all_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(read(&self.alerts, "alerts")?.clone())
    }

    fn known_incident_ids(&self) -> Result<FxHashSet<IncidentId>, StoreError> {
        let incidents = read(&self.incidents, "incidents")?;
        Ok(incidents.iter().map(|i| i.id).collect())
    }

    fn check_owner(known: &FxHashSet<IncidentId>, id: IncidentId) -> Result<(), StoreError> {
        if known.contains(&id) {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!(
                "incident `{id}` does not exist"
            )))
        }
    }
}

impl IncidentStore for InMemoryStore {
    fn incidents_with_status(&self, status: IncidentStatus) -> Result<Vec<Incident>, StoreError> {
        let incidents = read(&self.incidents, "incidents")?;
        Ok(incidents
            .iter()
            .filter(|i| i.status == status)
            .cloned()
            .collect())
    }

    fn incidents_with_status_newest_first(
        &self,
        status: IncidentStatus,
    ) -> Result<Vec<Incident>, StoreError> {
        let mut incidents = self.incidents_with_status(status)?;
        incidents.sort_by_key(|i| Reverse((i.started_at, i.id)));
        Ok(incidents)
    }

    fn insert_incident(&self, incident: NewIncident) -> Result<Incident, StoreError> {
        let mut incidents = write(&self.incidents, "incidents")?;
        let id = IncidentId(self.next_incident_id.fetch_add(1, Ordering::Relaxed));
        let stored = Incident {
            id,
            origin: incident.origin,
            title: incident.title,
            description: incident.description,
            incident_type: incident.incident_type,
            severity: incident.severity,
            status: incident.status,
            started_at: incident.started_at,
            resolved_at: None,
        };
        incidents.push(stored.clone());
        Ok(stored)
    }

    fn update_incident(&self, id: IncidentId, patch: &IncidentPatch) -> Result<(), StoreError> {
        let mut incidents = write(&self.incidents, "incidents")?;
        match incidents.iter_mut().find(|i| i.id == id) {
            Some(incident) => patch.apply_to(incident),
            None => debug!(incident_id = %id, "update matched no incident"),
        }
        Ok(())
    }

    fn all_cells(&self) -> Result<Vec<BurningCell>, StoreError> {
        Ok(read(&self.cells, "burning_cells")?.clone())
    }

    fn cells_for_incident(&self, id: IncidentId) -> Result<Vec<BurningCell>, StoreError> {
        let cells = read(&self.cells, "burning_cells")?;
        Ok(cells.iter().filter(|c| c.incident_id == id).copied().collect())
    }

    fn insert_cells(&self, new_cells: Vec<BurningCell>) -> Result<(), StoreError> {
        let known = self.known_incident_ids()?;
        for cell in &new_cells {
            Self::check_owner(&known, cell.incident_id)?;
        }
        write(&self.cells, "burning_cells")?.extend(new_cells);
        Ok(())
    }

    fn delete_cells_for_incident(&self, id: IncidentId) -> Result<usize, StoreError> {
        let mut cells = write(&self.cells, "burning_cells")?;
        let before = cells.len();
        cells.retain(|c| c.incident_id != id);
        Ok(before - cells.len())
    }

    fn delete_all_cells(&self) -> Result<usize, StoreError> {
        let mut cells = write(&self.cells, "burning_cells")?;
        let removed = cells.len();
        cells.clear();
        Ok(removed)
    }

    fn active_alerts(&self) -> Result<Vec<ActiveAlert>, StoreError> {
        let incidents = read(&self.incidents, "incidents")?;
        let alerts = read(&self.alerts, "alerts")?;
        Ok(alerts
            .iter()
            .filter_map(|alert| {
                let incident = incidents
                    .iter()
                    .find(|i| i.id == alert.incident_id && i.is_active())?;
                Some(ActiveAlert {
                    household_id: alert.household_id.clone(),
                    confirmed: alert.confirmed,
                    incident_id: incident.id,
                    status: incident.status,
                    incident_type: incident.incident_type,
                    severity: incident.severity,
                })
            })
            .collect())
    }

    fn alerts_for_incidents(&self, ids: &[IncidentId]) -> Result<Vec<Alert>, StoreError> {
        let wanted: FxHashSet<IncidentId> = ids.iter().copied().collect();
        let alerts = read(&self.alerts, "alerts")?;
        Ok(alerts
            .iter()
            .filter(|a| wanted.contains(&a.incident_id))
            .cloned()
            .collect())
    }

    fn insert_alerts(&self, new_alerts: Vec<Alert>) -> Result<(), StoreError> {
        let known = self.known_incident_ids()?;
        for alert in &new_alerts {
            Self::check_owner(&known, alert.incident_id)?;
        }
        write(&self.alerts, "alerts")?.extend(new_alerts);
        Ok(())
    }

    fn delete_all_alerts(&self) -> Result<usize, StoreError> {
        let mut alerts = write(&self.alerts, "alerts")?;
        let removed = alerts.len();
        alerts.clear();
        Ok(removed)
    }

    fn household(&self, id: &HouseholdId) -> Result<Option<Household>, StoreError> {
        let households = read(&self.households, "households")?;
        Ok(households.iter().find(|h| &h.id == id).cloned())
    }

    fn households(&self) -> Result<Vec<Household>, StoreError> {
        Ok(read(&self.households, "households")?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{IncidentType, Severity};
    use crate::grid::GridCoord;
    use chrono::{TimeZone, Utc};

    fn new_incident(minute: u32, incident_type: IncidentType) -> NewIncident {
        NewIncident {
            origin: HouseholdId::from("h-1"),
            title: format!("{} detected", incident_type.as_str().to_uppercase()),
            description: "Simulated sensor event".into(),
            incident_type,
            severity: Severity::LOW,
            status: IncidentStatus::Active,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_generates_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert_incident(new_incident(0, IncidentType::Fire)).unwrap();
        let b = store.insert_incident(new_incident(1, IncidentType::Gas)).unwrap();
        assert_eq!(a.id, IncidentId(1));
        assert_eq!(b.id, IncidentId(2));
        assert!(a.resolved_at.is_none());
    }

    #[test]
    fn test_newest_first_ordering() {
        let store = InMemoryStore::new();
        store.insert_incident(new_incident(5, IncidentType::Fire)).unwrap();
        store.insert_incident(new_incident(9, IncidentType::Fire)).unwrap();
        store.insert_incident(new_incident(1, IncidentType::Fire)).unwrap();

        let ordered = store
            .incidents_with_status_newest_first(IncidentStatus::Active)
            .unwrap();
        let ids: Vec<u64> = ordered.iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_cells_are_a_multiset() {
        let store = InMemoryStore::new();
        let incident = store.insert_incident(new_incident(0, IncidentType::Fire)).unwrap();
        let cell = BurningCell::decaying(incident.id, GridCoord::new(1, 1), 50.0, 0.7);
        store.insert_cells(vec![cell, cell]).unwrap();
        assert_eq!(store.all_cells().unwrap().len(), 2);
        assert_eq!(store.delete_cells_for_incident(incident.id).unwrap(), 2);
        assert!(store.all_cells().unwrap().is_empty());
    }

    #[test]
    fn test_cells_require_an_owner() {
        let store = InMemoryStore::new();
        let orphan = BurningCell::active(IncidentId(42), GridCoord::new(0, 0));
        let err = store.insert_cells(vec![orphan]).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.all_cells().unwrap().is_empty());
    }

    #[test]
    fn test_active_alert_join_filters_resolved() {
        let store = InMemoryStore::new();
        let live = store
            .insert_incident(new_incident(0, IncidentType::Intrusion))
            .unwrap();
        let done = store
            .insert_incident(new_incident(1, IncidentType::Intrusion))
            .unwrap();
        store
            .insert_alerts(vec![
                Alert {
                    incident_id: live.id,
                    household_id: "h-1".into(),
                    confirmed: true,
                },
                Alert {
                    incident_id: done.id,
                    household_id: "h-2".into(),
                    confirmed: true,
                },
            ])
            .unwrap();
        store
            .update_incident(done.id, &IncidentPatch::resolved(None))
            .unwrap();

        let active = store.active_alerts().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].incident_id, live.id);
        assert_eq!(active[0].incident_type, IncidentType::Intrusion);

        let by_id = store.alerts_for_incidents(&[done.id]).unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].household_id, HouseholdId::from("h-2"));
    }

    #[test]
    fn test_household_registry() {
        let store = InMemoryStore::with_households(vec![Household::new("h-1", 17.0, 78.0)]);
        assert!(store.household(&"h-1".into()).unwrap().is_some());
        assert!(store.household(&"h-9".into()).unwrap().is_none());
        assert!(store.add_household(Household::new("h-1", 0.0, 0.0)).is_err());
        store.add_household(Household::new("h-2", 17.1, 78.1)).unwrap();
        assert_eq!(store.households().unwrap().len(), 2);
    }

    #[test]
    fn test_update_unknown_incident_is_noop() {
        let store = InMemoryStore::new();
        store
            .update_incident(IncidentId(99), &IncidentPatch::severity(Severity::CRITICAL))
            .unwrap();
        assert!(store.all_incidents().unwrap().is_empty());
    }
}
