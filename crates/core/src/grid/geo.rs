//! Geographic coordinate to grid cell mapping
//!
//! Uses a local flat-earth approximation anchored at a fixed base coordinate.
//! Degree deltas are converted to meters with constant per-degree factors and
//! no latitude-dependent cosine correction. Downstream consumers compare cell
//! indices produced by this exact arithmetic, so the simplification stays.

use crate::config::GridConfig;
use crate::core_types::GeoPoint;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Meters per degree of longitude (applied at every latitude)
pub const METERS_PER_DEGREE_LNG: f64 = 111320.0;

/// Meters per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 110540.0;

/// Integer grid cell index relative to the anchor cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    #[serde(rename = "cell_x")]
    pub x: i32,
    #[serde(rename = "cell_y")]
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by `(dx, dy)` cells
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance in cell units
    pub fn distance_to(self, other: GridCoord) -> f64 {
        let delta = Vector2::new(f64::from(other.x - self.x), f64::from(other.y - self.y));
        delta.norm()
    }
}

/// Geographic rectangle covered by one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub lat_min: f64,
    pub lng_min: f64,
    pub lat_max: f64,
    pub lng_max: f64,
}

impl CellBounds {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.lat_min + self.lat_max) * 0.5,
            (self.lng_min + self.lng_max) * 0.5,
        )
    }
}

/// East/north displacement in meters from `from` to `to`
#[inline]
pub fn meter_offset(from: GeoPoint, to: GeoPoint) -> Vector2<f64> {
    Vector2::new(
        (to.longitude - from.longitude) * METERS_PER_DEGREE_LNG,
        (to.latitude - from.latitude) * METERS_PER_DEGREE_LAT,
    )
}

/// Straight-line distance in meters under the flat-earth approximation
pub fn planar_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    meter_offset(a, b).norm()
}

/// Converts between geographic positions and grid cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    anchor: GeoPoint,
    cell_size: f64,
}

impl GridMapper {
    /// Create a mapper anchored at `anchor` with square cells of `cell_size` meters
    pub fn new(anchor: GeoPoint, cell_size: f64) -> Self {
        Self { anchor, cell_size }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(GeoPoint::new(config.base_lat, config.base_lng), config.cell_size_m)
    }

    pub fn anchor(&self) -> GeoPoint {
        self.anchor
    }

    /// Cell edge length in meters
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `point`
    pub fn to_grid(&self, point: GeoPoint) -> GridCoord {
        let meters = meter_offset(self.anchor, point);
        GridCoord::new(
            (meters.x / self.cell_size).floor() as i32,
            (meters.y / self.cell_size).floor() as i32,
        )
    }

    /// Geographic bounds of `coord`, south-west corner first
    pub fn to_bounds(&self, coord: GridCoord) -> CellBounds {
        let lat_min =
            self.anchor.latitude + f64::from(coord.y) * self.cell_size / METERS_PER_DEGREE_LAT;
        let lng_min =
            self.anchor.longitude + f64::from(coord.x) * self.cell_size / METERS_PER_DEGREE_LNG;

        CellBounds {
            lat_min,
            lng_min,
            lat_max: lat_min + self.cell_size / METERS_PER_DEGREE_LAT,
            lng_max: lng_min + self.cell_size / METERS_PER_DEGREE_LNG,
        }
    }
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}
