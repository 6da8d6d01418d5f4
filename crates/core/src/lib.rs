//! Neighborhood Incident Simulation Core Library
//!
//! Models hazards spreading across a fixed neighborhood of households on a
//! uniform square grid laid over latitude/longitude.
//!
//! ## Propagation models
//!
//! - Decay propagation: each burning cell emits weaker copies of itself into
//!   its 8 neighbors until the risk falls below a threshold
//! - Wave expansion: active incidents grow into their 4 neighbors with a
//!   severity-dependent probability
//! - Intrusion fan-out: intrusions skip the grid and alert every household
//!   within a fixed radius
//!
//! Incidents escalate with elapsed time, and ticks are driven externally by
//! calling the engine (or the fail-soft [`SimulationService`]) repeatedly.

// Data types shared across modules
pub mod core_types;

// Grid mapping and geometry
pub mod grid;

// Tunables and their JSON loading
pub mod config;

pub mod error;

// Persistence seam and the in-memory implementation
pub mod store;

// Engine operations
pub mod simulation;

// Fail-soft boundary for HTTP handlers and CLIs
pub mod api;

pub use core_types::{
    ActiveAlert, Alert, BurningCell, CellState, GeoPoint, Household, HouseholdId, Incident,
    IncidentId, IncidentStatus, IncidentType, Severity,
};
pub use grid::{CellBounds, GridCoord, GridMapper};

pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use store::{InMemoryStore, IncidentStore, StoreError};

pub use api::{ApiResponse, ResponseStatus, SimulationService};
pub use simulation::{
    Clock, HouseholdAssessment, HouseholdStatus, IncidentEngine, IncidentReport, ManualClock,
    NeighborhoodStatus, RandomSource, ScriptedRandom, SeededRandom, SystemClock,
};
