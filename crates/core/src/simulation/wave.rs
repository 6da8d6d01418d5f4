//! Wave expansion: binary presence spreading over the von Neumann neighborhood
//!
//! Each active, grid-spreading incident is processed as its own arena. The
//! incident's current cells form the frontier; every unoccupied 4-neighbor of
//! a frontier cell is admitted with a severity-dependent chance, and admitted
//! coordinates are marked occupied immediately so nothing is admitted twice
//! within one tick. Cells of other incidents are never consulted.

use super::random::RandomSource;
use super::IncidentEngine;
use crate::core_types::{BurningCell, IncidentId, IncidentStatus};
use crate::error::EngineError;
use crate::grid::{GridCoord, VON_NEUMANN_OFFSETS};
use crate::store::IncidentStore;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Cells admitted by one wave tick over a single incident's `frontier`
///
/// One draw is taken per unoccupied candidate; a candidate is admitted when
/// the draw is `<= chance`.
pub fn expand<R: RandomSource + ?Sized>(
    incident_id: IncidentId,
    frontier: &[BurningCell],
    chance: f64,
    rng: &mut R,
) -> Vec<BurningCell> {
    let mut occupied: FxHashSet<GridCoord> = frontier.iter().map(|c| c.coord).collect();
    let mut admitted = Vec::new();

    for cell in frontier {
        for &(dx, dy) in &VON_NEUMANN_OFFSETS {
            let candidate = cell.coord.offset(dx, dy);
            if occupied.contains(&candidate) {
                continue;
            }
            if rng.next_unit() <= chance {
                admitted.push(BurningCell::active(incident_id, candidate));
                occupied.insert(candidate);
            }
        }
    }

    admitted
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Run one wave expansion tick over every active non-intrusion incident
    ///
    /// Admitted cells are inserted per incident as soon as that incident is
    /// processed. Returns the total number of rows inserted.
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] on the first failing store call.
    /// Incidents processed before the failure keep their inserted cells.
    pub fn propagate_wave<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<usize, EngineError> {
        let incidents = self.store.incidents_with_status(IncidentStatus::Active)?;
        let mut total = 0;

        for incident in incidents
            .iter()
            .filter(|i| i.incident_type.spreads_on_grid())
        {
            let frontier = self.store.cells_for_incident(incident.id)?;
            if frontier.is_empty() {
                continue;
            }

            let chance = self.config.wave.expansion_chance(incident.severity);
            let admitted = expand(incident.id, &frontier, chance, rng);
            debug!(
                incident_id = %incident.id,
                severity = %incident.severity,
                frontier = frontier.len(),
                admitted = admitted.len(),
                "wave expanded"
            );

            if !admitted.is_empty() {
                total += admitted.len();
                self.store.insert_cells(admitted)?;
            }
        }

        Ok(total)
    }
}
