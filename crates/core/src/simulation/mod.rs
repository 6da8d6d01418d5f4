//! Incident simulation engine
//!
//! `IncidentEngine` ties together:
//! - Incident lifecycle (report, elapsed-time escalation, resolve, reset)
//! - Decay propagation (continuous risk, 8-neighborhood)
//! - Wave expansion (binary presence, 4-neighborhood, random admission)
//! - Intrusion alert fan-out
//! - Household risk assessment
//!
//! The engine holds no simulation state of its own. Every operation is one
//! synchronous unit of work against the injected store, and ticks are driven
//! from outside: nothing here schedules itself.

pub mod assessment;
pub mod clock;
pub mod decay;
pub mod intrusion;
pub mod lifecycle;
pub mod random;
pub mod wave;

pub use assessment::{HouseholdAssessment, HouseholdStatus, NeighborhoodStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::{IncidentReport, ReportOutcome, ResetSummary, ResolveSummary};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};

use crate::config::EngineConfig;
use crate::core_types::{
    ActiveAlert, Alert, BurningCell, Household, Incident, IncidentId, IncidentStatus,
};
use crate::error::EngineError;
use crate::grid::GridMapper;
use crate::store::IncidentStore;
use std::sync::Arc;

/// Stateless incident engine over an injected store
pub struct IncidentEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    mapper: GridMapper,
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Create an engine over `store` reading time from `clock`
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let mapper = GridMapper::from_config(&config.grid);
        Self {
            store,
            clock,
            config,
            mapper,
        }
    }

    /// Create an engine that reads wall-clock time
    pub fn with_system_clock(store: Arc<S>, config: EngineConfig) -> Self {
        Self::new(store, Arc::new(SystemClock), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    /// Active incidents, newest first
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the incidents cannot be read.
    pub fn active_incidents(&self) -> Result<Vec<Incident>, EngineError> {
        Ok(self
            .store
            .incidents_with_status_newest_first(IncidentStatus::Active)?)
    }

    /// Every burning cell, across all incidents
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the cells cannot be read.
    pub fn burning_cells(&self) -> Result<Vec<BurningCell>, EngineError> {
        Ok(self.store.all_cells()?)
    }

    /// Alerts of active incidents with their incident fields
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the alerts cannot be read.
    pub fn active_alerts(&self) -> Result<Vec<ActiveAlert>, EngineError> {
        Ok(self.store.active_alerts()?)
    }

    /// Alerts of the listed incidents, whatever their status
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the alerts cannot be read.
    pub fn alerts_for_incidents(&self, ids: &[IncidentId]) -> Result<Vec<Alert>, EngineError> {
        Ok(self.store.alerts_for_incidents(ids)?)
    }

    /// Household registry
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the registry cannot be read.
    pub fn households(&self) -> Result<Vec<Household>, EngineError> {
        Ok(self.store.households()?)
    }
}
