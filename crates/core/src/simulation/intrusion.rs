//! Intrusion alert fan-out
//!
//! Intrusions bypass the grid. Every household within a fixed radius of the
//! origin (raw flat-earth meters, inclusive) gets one alert row; only the
//! origin's row is marked confirmed.

use super::IncidentEngine;
use crate::core_types::{Alert, Household, HouseholdId, IncidentId};
use crate::error::EngineError;
use crate::grid::planar_distance;
use crate::store::IncidentStore;
use tracing::debug;

/// Alert rows for every household within `radius_m` of `origin`
///
/// The origin is always within its own radius, so the result is never empty
/// when `households` contains it.
pub fn fan_out(
    incident_id: IncidentId,
    origin: &Household,
    households: &[Household],
    radius_m: f64,
) -> Vec<Alert> {
    let origin_point = origin.location();
    households
        .iter()
        .filter(|house| planar_distance(origin_point, house.location()) <= radius_m)
        .map(|house| Alert {
            incident_id,
            household_id: house.id.clone(),
            confirmed: house.id == origin.id,
        })
        .collect()
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Alert households around `origin_id` about `incident_id`
    ///
    /// Returns the number of alert rows written.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] if the origin household is unknown,
    /// or [`EngineError::StoreFailure`] if a store call fails.
    pub fn alert_intrusion(
        &self,
        incident_id: IncidentId,
        origin_id: &HouseholdId,
    ) -> Result<usize, EngineError> {
        let origin = self
            .store
            .household(origin_id)?
            .ok_or_else(|| EngineError::household_not_found(origin_id))?;
        self.fan_out_alerts(incident_id, &origin)
    }

    pub(crate) fn fan_out_alerts(
        &self,
        incident_id: IncidentId,
        origin: &Household,
    ) -> Result<usize, EngineError> {
        let households = self.store.households()?;
        let alerts = fan_out(
            incident_id,
            origin,
            &households,
            self.config.intrusion.radius_m,
        );
        let count = alerts.len();
        if count > 0 {
            self.store.insert_alerts(alerts)?;
        }

        debug!(
            incident_id = %incident_id,
            scanned = households.len(),
            alerted = count,
            "intrusion alerts fanned out"
        );
        Ok(count)
    }
}
