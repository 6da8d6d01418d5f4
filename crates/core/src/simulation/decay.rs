//! Decay propagation: continuous risk spreading over the Moore neighborhood
//!
//! Every decaying cell pushes `risk_level * decay_factor` onto each of its 8
//! neighbors, provided the result is not below the cutoff threshold. Emitted
//! rows inherit the source cell's incident and decay factor.
//!
//! Emissions are never merged: two sources adjacent to the same coordinate
//! both emit a row for it, and rows already present at a coordinate do not
//! suppress new ones. The cell collection is a multiset under this algorithm.

use super::IncidentEngine;
use crate::core_types::{BurningCell, CellState};
use crate::error::EngineError;
use crate::grid::MOORE_OFFSETS;
use crate::store::IncidentStore;
use rayon::prelude::*;
use tracing::debug;

/// Cells emitted by one decay tick over `cells`
///
/// Presence-only cells carry no risk and emit nothing.
pub fn spread(cells: &[BurningCell], risk_threshold: f64) -> Vec<BurningCell> {
    cells
        .par_iter()
        .flat_map_iter(|cell| emissions(*cell, risk_threshold))
        .collect()
}

fn emissions(cell: BurningCell, risk_threshold: f64) -> impl Iterator<Item = BurningCell> {
    let propagated = match cell.state {
        CellState::Decaying {
            risk_level,
            decay_factor,
        } => {
            let new_risk = risk_level * decay_factor;
            (new_risk >= risk_threshold).then_some((new_risk, decay_factor))
        }
        CellState::Active => None,
    };

    propagated.into_iter().flat_map(move |(new_risk, decay_factor)| {
        MOORE_OFFSETS.iter().map(move |&(dx, dy)| {
            BurningCell::decaying(
                cell.incident_id,
                cell.coord.offset(dx, dy),
                new_risk,
                decay_factor,
            )
        })
    })
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Run one decay propagation tick over every stored cell
    ///
    /// Cells are not filtered by incident status, so cells of resolved
    /// incidents that were never deleted keep spreading. Returns the number
    /// of rows inserted.
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if reading or inserting cells fails.
    pub fn propagate_risk(&self) -> Result<usize, EngineError> {
        let cells = self.store.all_cells()?;
        if cells.is_empty() {
            debug!("risk tick skipped: no cells");
            return Ok(0);
        }

        let emitted = spread(&cells, self.config.decay.risk_threshold);
        let count = emitted.len();
        if count > 0 {
            self.store.insert_cells(emitted)?;
        }

        debug!(sources = cells.len(), emitted = count, "risk tick complete");
        Ok(count)
    }
}
