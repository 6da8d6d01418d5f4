//! Grid geometry: geographic mapping and cell neighborhoods

pub mod geo;

pub use geo::{
    meter_offset, planar_distance, CellBounds, GridCoord, GridMapper, METERS_PER_DEGREE_LAT,
    METERS_PER_DEGREE_LNG,
};

/// Moore neighborhood offsets (8 neighbors, origin excluded)
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Von Neumann neighborhood offsets (4 neighbors)
pub const VON_NEUMANN_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
