//! Storage contract consumed by the engine
//!
//! The engine never owns physical storage. It talks to whatever backs the
//! incident, burning-cell, alert and household collections through
//! [`IncidentStore`], and the process entry point decides which implementation
//! to construct and when to drop it.
//!
//! No method spans more than one collection call, and the contract offers no
//! transactions: a read of the current cells followed by an insert of new ones
//! is two independent calls, so overlapping ticks can observe stale state.

mod memory;

pub use memory::InMemoryStore;

use crate::core_types::{
    ActiveAlert, Alert, BurningCell, Household, HouseholdId, Incident, IncidentId, IncidentPatch,
    IncidentStatus, NewIncident,
};
use thiserror::Error;

/// Failure reported by a store implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("lock on `{collection}` was poisoned by a panic in another thread")]
    LockPoisoned { collection: &'static str },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// CRUD surface over the four collections the engine touches
pub trait IncidentStore: Send + Sync {
    /// Incidents with the given status, in no particular order
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection cannot be read.
    fn incidents_with_status(&self, status: IncidentStatus) -> Result<Vec<Incident>, StoreError>;

    /// Incidents with the given status, newest first by creation time
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection cannot be read.
    fn incidents_with_status_newest_first(
        &self,
        status: IncidentStatus,
    ) -> Result<Vec<Incident>, StoreError>;

    /// Insert an incident and return it with its generated id
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the insert fails.
    fn insert_incident(&self, incident: NewIncident) -> Result<Incident, StoreError>;

    /// Apply a partial update by id. Updating an unknown id is a no-op.
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the update fails.
    fn update_incident(&self, id: IncidentId, patch: &IncidentPatch) -> Result<(), StoreError>;

    /// Every burning cell, regardless of incident or incident status
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection cannot be read.
    fn all_cells(&self) -> Result<Vec<BurningCell>, StoreError>;

    /// Cells owned by one incident
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection cannot be read.
    fn cells_for_incident(&self, id: IncidentId) -> Result<Vec<BurningCell>, StoreError>;

    /// Append cells as new rows. Existing rows at the same coordinate are kept.
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the insert fails.
    fn insert_cells(&self, cells: Vec<BurningCell>) -> Result<(), StoreError>;

    /// Delete one incident's cells and return how many were removed
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the delete fails.
    fn delete_cells_for_incident(&self, id: IncidentId) -> Result<usize, StoreError>;

    /// Delete every cell and return how many were removed
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the delete fails.
    fn delete_all_cells(&self) -> Result<usize, StoreError>;

    /// Alerts whose incident is active, joined with incident fields
    ///
    /// # Errors
    /// Returns a [`StoreError`] if either collection cannot be read.
    fn active_alerts(&self) -> Result<Vec<ActiveAlert>, StoreError>;

    /// Alerts belonging to any incident in `ids`
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the collection cannot be read.
    fn alerts_for_incidents(&self, ids: &[IncidentId]) -> Result<Vec<Alert>, StoreError>;

    /// Append alert rows
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the insert fails.
    fn insert_alerts(&self, alerts: Vec<Alert>) -> Result<(), StoreError>;

    /// Delete every alert and return how many were removed
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the delete fails.
    fn delete_all_alerts(&self) -> Result<usize, StoreError>;

    /// Look up one household
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the registry cannot be read.
    fn household(&self, id: &HouseholdId) -> Result<Option<Household>, StoreError>;

    /// Every household
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the registry cannot be read.
    fn households(&self) -> Result<Vec<Household>, StoreError>;
}
