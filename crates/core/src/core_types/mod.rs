//! Core record types shared by the store and the engine

pub mod alert;
pub mod cell;
pub mod household;
pub mod incident;

pub use alert::{ActiveAlert, Alert};
pub use cell::{BurningCell, CellState};
pub use household::{GeoPoint, Household, HouseholdId};
pub use incident::{
    Incident, IncidentId, IncidentPatch, IncidentStatus, IncidentType, NewIncident,
    ParseIncidentTypeError, Severity,
};
