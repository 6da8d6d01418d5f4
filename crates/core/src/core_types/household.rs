//! Households: immutable reference nodes supplied by an external registry

use serde::{Deserialize, Serialize};
use std::fmt;

/// External household (node) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseholdId(pub String);

impl HouseholdId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HouseholdId {
    fn from(value: &str) -> Self {
        HouseholdId(value.to_string())
    }
}

impl From<String> for HouseholdId {
    fn from(value: String) -> Self {
        HouseholdId(value)
    }
}

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Household node. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub latitude: f64,
    pub longitude: f64,
}

impl Household {
    pub fn new(id: impl Into<HouseholdId>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
