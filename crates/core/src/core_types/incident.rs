//! Incident records and the enums that classify them
//!
//! An incident is the root of all mutable simulation state: burning cells and
//! alerts hang off its id, and only its severity and status ever change after
//! it is reported.

use super::household::HouseholdId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Store-generated incident identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub u64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of hazard an incident describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentType {
    /// Spreads over the grid
    Fire,
    /// Spreads over the grid like fire
    Gas,
    /// Never touches the grid; fans out alerts to nearby households instead
    Intrusion,
}

impl IncidentType {
    /// Get the lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::Fire => "fire",
            IncidentType::Gas => "gas",
            IncidentType::Intrusion => "intrusion",
        }
    }

    /// Whether this incident type seeds and spreads grid cells
    pub fn spreads_on_grid(&self) -> bool {
        !matches!(self, IncidentType::Intrusion)
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown incident type name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown incident type `{0}` (expected fire, gas or intrusion)")]
pub struct ParseIncidentTypeError(pub String);

impl FromStr for IncidentType {
    type Err = ParseIncidentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fire" => Ok(IncidentType::Fire),
            "gas" => Ok(IncidentType::Gas),
            "intrusion" => Ok(IncidentType::Intrusion),
            _ => Err(ParseIncidentTypeError(s.to_string())),
        }
    }
}

/// Lifecycle status of an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Resolved,
}

/// Incident severity level
///
/// Recognized levels are 1 to 3. Reports are not validated, so any other value
/// is carried as-is and each consumer decides how to treat it (severity
/// profiles fall back to level 1, wave expansion treats it like level 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(pub u8);

impl Severity {
    pub const LOW: Severity = Severity(1);
    pub const ELEVATED: Severity = Severity(2);
    pub const CRITICAL: Severity = Severity(3);

    /// Raw level value
    pub fn level(self) -> u8 {
        self.0
    }

    /// Whether the level is one of 1, 2 or 3
    pub fn is_recognized(self) -> bool {
        (1..=3).contains(&self.0)
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::LOW
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reported incident as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    /// Household where the incident was first reported
    pub origin: HouseholdId,
    pub title: String,
    pub description: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub status: IncidentStatus,
    /// Report time; also the creation time used for newest-first ordering
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.status == IncidentStatus::Active
    }
}

/// Field set for inserting an incident; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    pub origin: HouseholdId,
    pub title: String,
    pub description: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub started_at: DateTime<Utc>,
}

/// Partial update applied by id. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentPatch {
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl IncidentPatch {
    /// Patch that only changes severity
    pub fn severity(severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            ..Self::default()
        }
    }

    /// Patch that marks the incident resolved, optionally stamping the time
    pub fn resolved(at: Option<DateTime<Utc>>) -> Self {
        Self {
            status: Some(IncidentStatus::Resolved),
            resolved_at: at,
            ..Self::default()
        }
    }

    /// Apply this patch to an incident in place
    pub fn apply_to(&self, incident: &mut Incident) {
        if let Some(severity) = self.severity {
            incident.severity = severity;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
        if let Some(resolved_at) = self.resolved_at {
            incident.resolved_at = Some(resolved_at);
        }
    }
}
