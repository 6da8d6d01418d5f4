//! Intrusion alerts

use super::household::HouseholdId;
use super::incident::{IncidentId, IncidentStatus, IncidentType, Severity};
use serde::{Deserialize, Serialize};

/// One alert row: a household notified about an incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub incident_id: IncidentId,
    pub household_id: HouseholdId,
    /// True only for the household the intrusion was reported at
    pub confirmed: bool,
}

/// An alert joined with the incident fields a map view needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub household_id: HouseholdId,
    pub confirmed: bool,
    pub incident_id: IncidentId,
    pub status: IncidentStatus,
    pub incident_type: IncidentType,
    pub severity: Severity,
}
