//! Household risk assessment for map overlays
//!
//! Each household reads the strongest fire influence among nearby decaying
//! cells. A cell reaches 1, 2 or 3 cells out depending on its risk, and its
//! influence falls off as `risk * decay^distance` in cell units. Presence-only
//! wave cells carry no risk and never contribute. An active intrusion alert on
//! the household takes precedence over any fire reading.

use super::IncidentEngine;
use crate::config::AssessmentConfig;
use crate::core_types::{ActiveAlert, BurningCell, CellState, Household, HouseholdId, IncidentType};
use crate::error::EngineError;
use crate::grid::{GridCoord, GridMapper};
use crate::store::IncidentStore;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Overlay classification of one household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdStatus {
    Safe,
    Elevated,
    High,
    Critical,
    /// Household the intrusion was reported at
    IntrusionOrigin,
    /// Household alerted because it is near an intrusion
    IntrusionNeighbor,
}

/// Assessment of one household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdAssessment {
    pub household_id: HouseholdId,
    pub cell: GridCoord,
    /// Strongest fire influence, 0 when no cell reaches the household
    pub fire_risk: f64,
    pub status: HouseholdStatus,
}

/// Whole-neighborhood summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NeighborhoodStatus {
    Safe,
    IncidentActive { burning_cells: usize },
}

impl NeighborhoodStatus {
    pub fn from_cell_count(burning_cells: usize) -> Self {
        if burning_cells == 0 {
            NeighborhoodStatus::Safe
        } else {
            NeighborhoodStatus::IncidentActive { burning_cells }
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, NeighborhoodStatus::Safe)
    }
}

fn reach(risk_level: f64, config: &AssessmentConfig) -> f64 {
    if risk_level > config.wide_reach_risk {
        3.0
    } else if risk_level > config.medium_reach_risk {
        2.0
    } else {
        1.0
    }
}

/// Strongest decayed influence of `cells` on the household in `target`
pub fn fire_risk_at(target: GridCoord, cells: &[BurningCell], config: &AssessmentConfig) -> f64 {
    cells
        .iter()
        .filter_map(|cell| match cell.state {
            CellState::Decaying {
                risk_level,
                decay_factor,
            } => {
                let distance = cell.coord.distance_to(target);
                (distance <= reach(risk_level, config))
                    .then(|| risk_level * decay_factor.powf(distance))
            }
            CellState::Active => None,
        })
        .fold(0.0, f64::max)
}

/// Classify a fire risk reading
pub fn classify_fire_risk(fire_risk: f64, config: &AssessmentConfig) -> HouseholdStatus {
    if fire_risk > config.critical_above {
        HouseholdStatus::Critical
    } else if fire_risk > config.high_above {
        HouseholdStatus::High
    } else if fire_risk > config.elevated_above {
        HouseholdStatus::Elevated
    } else {
        HouseholdStatus::Safe
    }
}

/// Assess every household against the current cells and active alerts
///
/// Only the first alert listed for a household is consulted, and it only
/// overrides the fire reading when it belongs to an intrusion.
pub fn assess(
    households: &[Household],
    cells: &[BurningCell],
    alerts: &[ActiveAlert],
    mapper: &GridMapper,
    config: &AssessmentConfig,
) -> Vec<HouseholdAssessment> {
    let mut first_alert: FxHashMap<&HouseholdId, &ActiveAlert> = FxHashMap::default();
    for alert in alerts {
        first_alert.entry(&alert.household_id).or_insert(alert);
    }

    households
        .par_iter()
        .map(|house| {
            let cell = mapper.to_grid(house.location());
            let fire_risk = fire_risk_at(cell, cells, config);
            let status = match first_alert.get(&house.id) {
                Some(alert) if alert.incident_type == IncidentType::Intrusion => {
                    if alert.confirmed {
                        HouseholdStatus::IntrusionOrigin
                    } else {
                        HouseholdStatus::IntrusionNeighbor
                    }
                }
                _ => classify_fire_risk(fire_risk, config),
            };
            HouseholdAssessment {
                household_id: house.id.clone(),
                cell,
                fire_risk,
                status,
            }
        })
        .collect()
}

impl<S: IncidentStore> IncidentEngine<S> {
    /// Assess every household against the stored cells and active alerts
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if any collection cannot be read.
    pub fn assess_households(&self) -> Result<Vec<HouseholdAssessment>, EngineError> {
        let households = self.store.households()?;
        let cells = self.store.all_cells()?;
        let alerts = self.store.active_alerts()?;
        Ok(assess(
            &households,
            &cells,
            &alerts,
            &self.mapper,
            &self.config.assessment,
        ))
    }

    /// Safe when no cell is burning anywhere
    ///
    /// # Errors
    /// Returns [`EngineError::StoreFailure`] if the cells cannot be read.
    pub fn neighborhood_status(&self) -> Result<NeighborhoodStatus, EngineError> {
        let cells = self.store.all_cells()?;
        Ok(NeighborhoodStatus::from_cell_count(cells.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{IncidentId, IncidentStatus, Severity};
    use approx::assert_relative_eq;

    fn config() -> AssessmentConfig {
        AssessmentConfig::default()
    }

    #[test]
    fn test_reach_depends_on_risk() {
        let strong = BurningCell::decaying(IncidentId(1), GridCoord::new(0, 0), 100.0, 0.85);
        let weak = BurningCell::decaying(IncidentId(1), GridCoord::new(0, 0), 40.0, 0.6);

        // Three cells out: only the strong cell reaches
        let target = GridCoord::new(3, 0);
        assert_relative_eq!(
            fire_risk_at(target, &[strong], &config()),
            100.0 * 0.85_f64.powi(3),
            epsilon = 1e-9
        );
        assert_eq!(fire_risk_at(target, &[weak], &config()), 0.0);

        // Risk of exactly 40 is not above the medium threshold, so reach is 1
        assert_eq!(fire_risk_at(GridCoord::new(2, 0), &[weak], &config()), 0.0);
        assert_relative_eq!(
            fire_risk_at(GridCoord::new(1, 0), &[weak], &config()),
            24.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_strongest_cell_wins() {
        let cells = [
            BurningCell::decaying(IncidentId(1), GridCoord::new(0, 0), 100.0, 0.85),
            BurningCell::decaying(IncidentId(2), GridCoord::new(5, 5), 70.0, 0.75),
            BurningCell::active(IncidentId(3), GridCoord::new(5, 5)),
        ];
        assert_relative_eq!(
            fire_risk_at(GridCoord::new(5, 5), &cells, &config()),
            70.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            fire_risk_at(GridCoord::new(0, 0), &cells, &config()),
            100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_classification_thresholds() {
        let c = config();
        assert_eq!(classify_fire_risk(100.0, &c), HouseholdStatus::Critical);
        assert_eq!(classify_fire_risk(75.0, &c), HouseholdStatus::High);
        assert_eq!(classify_fire_risk(46.0, &c), HouseholdStatus::High);
        assert_eq!(classify_fire_risk(45.0, &c), HouseholdStatus::Elevated);
        assert_eq!(classify_fire_risk(15.0, &c), HouseholdStatus::Safe);
        assert_eq!(classify_fire_risk(0.0, &c), HouseholdStatus::Safe);
    }

    #[test]
    fn test_intrusion_alert_overrides_fire() {
        let mapper = GridMapper::default();
        let anchor = mapper.anchor();
        let households = vec![
            Household::new("a", anchor.latitude, anchor.longitude),
            Household::new("b", anchor.latitude, anchor.longitude),
            Household::new("c", anchor.latitude, anchor.longitude),
        ];
        let cells = [BurningCell::decaying(
            IncidentId(1),
            GridCoord::new(0, 0),
            100.0,
            0.85,
        )];
        let alert = |id: &str, confirmed: bool| ActiveAlert {
            household_id: id.into(),
            confirmed,
            incident_id: IncidentId(2),
            status: IncidentStatus::Active,
            incident_type: IncidentType::Intrusion,
            severity: Severity::LOW,
        };
        let alerts = vec![alert("a", true), alert("b", false)];

        let result = assess(&households, &cells, &alerts, &mapper, &config());
        assert_eq!(result[0].status, HouseholdStatus::IntrusionOrigin);
        assert_eq!(result[1].status, HouseholdStatus::IntrusionNeighbor);
        assert_eq!(result[2].status, HouseholdStatus::Critical);
        assert_relative_eq!(result[0].fire_risk, 100.0, epsilon = 1e-9);
        assert_eq!(result[2].cell, GridCoord::new(0, 0));
    }

    #[test]
    fn test_neighborhood_status() {
        assert!(NeighborhoodStatus::from_cell_count(0).is_safe());
        assert_eq!(
            NeighborhoodStatus::from_cell_count(3),
            NeighborhoodStatus::IncidentActive { burning_cells: 3 }
        );
    }
}
