//! Burning cells: the per-incident occupancy of the risk grid

use super::incident::IncidentId;
use crate::grid::GridCoord;
use serde::{Deserialize, Serialize};

/// What a cell carries beyond its position
///
/// Decay propagation works on continuous risk values; wave expansion only
/// records presence. The two shapes are kept apart instead of using sentinel
/// risk values for wave cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellState {
    /// Seeded or decay-propagated cell
    Decaying {
        /// Non-negative risk value
        risk_level: f64,
        /// Multiplier in (0, 1) applied per propagation step
        decay_factor: f64,
    },
    /// Binary presence written by wave expansion
    Active,
}

impl CellState {
    /// Risk level, if this cell carries one
    pub fn risk_level(&self) -> Option<f64> {
        match *self {
            CellState::Decaying { risk_level, .. } => Some(risk_level),
            CellState::Active => None,
        }
    }

    /// Decay factor, if this cell carries one
    pub fn decay_factor(&self) -> Option<f64> {
        match *self {
            CellState::Decaying { decay_factor, .. } => Some(decay_factor),
            CellState::Active => None,
        }
    }
}

/// One row of the burning-cell collection
///
/// Cells are owned by exactly one incident. Several rows may share a
/// coordinate, both across incidents and (under decay propagation) within one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurningCell {
    pub incident_id: IncidentId,
    #[serde(flatten)]
    pub coord: GridCoord,
    #[serde(flatten)]
    pub state: CellState,
}

impl BurningCell {
    /// Create a cell with continuous risk
    pub fn decaying(
        incident_id: IncidentId,
        coord: GridCoord,
        risk_level: f64,
        decay_factor: f64,
    ) -> Self {
        Self {
            incident_id,
            coord,
            state: CellState::Decaying {
                risk_level,
                decay_factor,
            },
        }
    }

    /// Create a presence-only cell
    pub fn active(incident_id: IncidentId, coord: GridCoord) -> Self {
        Self {
            incident_id,
            coord,
            state: CellState::Active,
        }
    }
}
