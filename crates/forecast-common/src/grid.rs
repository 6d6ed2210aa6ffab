//! Grid specifications for the canonical model grid.

use serde::{Deserialize, Serialize};

/// The fixed pressure levels (hPa) the model is trained on, ascending.
pub const PRESSURE_LEVELS_37: [i32; 37] = [
    1, 2, 3, 5, 7, 10, 20, 30, 50, 70, 100, 125, 150, 175, 200, 225, 250, 300, 350, 400, 450,
    500, 550, 600, 650, 700, 750, 775, 800, 825, 850, 875, 900, 925, 950, 975, 1000,
];

/// Tolerance (degrees) used when comparing coordinate vectors.
pub const COORD_TOLERANCE: f32 = 1e-4;

/// Specification of a regular global lat/lon grid.
///
/// Latitudes run from -90 to 90 inclusive; longitudes start at 0 and stop one
/// step short of 360, so the grid wraps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonGrid {
    /// Number of latitude points
    pub nlat: usize,
    /// Number of longitude points
    pub nlon: usize,
}

impl LatLonGrid {
    pub fn new(nlat: usize, nlon: usize) -> Self {
        Self { nlat, nlon }
    }

    /// Global grid with the given spacing in degrees.
    pub fn global(resolution: f64) -> Self {
        let nlat = (180.0 / resolution).round() as usize + 1;
        let nlon = (360.0 / resolution).round() as usize;
        Self { nlat, nlon }
    }

    /// Latitude spacing in degrees.
    pub fn lat_step(&self) -> f64 {
        if self.nlat > 1 {
            180.0 / (self.nlat - 1) as f64
        } else {
            0.0
        }
    }

    /// Longitude spacing in degrees.
    pub fn lon_step(&self) -> f64 {
        if self.nlon > 0 {
            360.0 / self.nlon as f64
        } else {
            0.0
        }
    }

    /// Ascending latitude coordinates, -90..=90.
    pub fn lat_coords(&self) -> Vec<f32> {
        let step = self.lat_step();
        (0..self.nlat)
            .map(|i| (-90.0 + i as f64 * step) as f32)
            .collect()
    }

    /// Ascending longitude coordinates, 0..360 (exclusive).
    pub fn lon_coords(&self) -> Vec<f32> {
        let step = self.lon_step();
        (0..self.nlon).map(|i| (i as f64 * step) as f32).collect()
    }

    /// Check whether the given coordinate vectors describe this grid.
    pub fn matches(&self, lat: &[f32], lon: &[f32]) -> bool {
        coords_match(&self.lat_coords(), lat) && coords_match(&self.lon_coords(), lon)
    }

    /// Total number of horizontal grid points.
    pub fn len(&self) -> usize {
        self.nlat * self.nlon
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nlat == 0 || self.nlon == 0
    }
}

impl Default for LatLonGrid {
    fn default() -> Self {
        grids::era5_0p25()
    }
}

/// Compare two coordinate vectors element-wise within [`COORD_TOLERANCE`].
pub fn coords_match(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= COORD_TOLERANCE)
}

/// Common grid definitions.
pub mod grids {
    use super::*;

    /// ERA5 0.25° global grid (721 x 1440)
    pub fn era5_0p25() -> LatLonGrid {
        LatLonGrid::new(721, 1440)
    }

    /// 1.0° global grid (181 x 360)
    pub fn global_1p0() -> LatLonGrid {
        LatLonGrid::new(181, 360)
    }
}
