//! Common test fixtures for forecast-prep tests.
//!
//! Pre-defined coordinates, timestamps and provider names describing a small
//! reanalysis download in the provider's own layout (latitude descending,
//! pressure levels in request order).

/// Small global grids.
pub mod grid {
    /// Reference 0.25 degree grid.
    pub const ERA5_0P25: GridSpec = GridSpec { nlat: 721, nlon: 1440 };

    /// 45 degree grid: lat -90..90 (5 points), lon 0..315 (8 points).
    pub const COARSE_5X8: GridSpec = GridSpec { nlat: 5, nlon: 8 };

    /// Grid size for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub nlat: usize,
        pub nlon: usize,
    }

    impl GridSpec {
        pub fn lat_step(&self) -> f64 {
            180.0 / (self.nlat - 1) as f64
        }

        pub fn lon_step(&self) -> f64 {
            360.0 / self.nlon as f64
        }

        /// Latitudes as the provider delivers them (90 down to -90).
        pub fn lat_descending(&self) -> Vec<f64> {
            (0..self.nlat)
                .map(|i| 90.0 - i as f64 * self.lat_step())
                .collect()
        }

        pub fn lat_ascending(&self) -> Vec<f64> {
            (0..self.nlat)
                .map(|i| -90.0 + i as f64 * self.lat_step())
                .collect()
        }

        pub fn lon(&self) -> Vec<f64> {
            (0..self.nlon).map(|i| i as f64 * self.lon_step()).collect()
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// The day every synthetic source covers.
    pub const REFERENCE_DAY: &str = "2024-07-21";

    /// Instantaneous source timestamps.
    pub const INSTANTS: [&str; 2] = ["2024-07-21T12:00:00Z", "2024-07-21T18:00:00Z"];

    /// Hours covered by the hourly accumulated source.
    pub const ACCUM_HOURS: std::ops::RangeInclusive<u32> = 7..=18;
}

/// Pressure levels as requested from the provider (descending).
pub mod levels {
    pub const REQUEST_ORDER: [i32; 37] = [
        1000, 975, 950, 925, 900, 875, 850, 825, 800, 775, 750, 700, 650, 600, 550, 500, 450,
        400, 350, 300, 250, 225, 200, 175, 150, 125, 100, 70, 50, 30, 20, 10, 7, 5, 3, 2, 1,
    ];
}

/// Provider variable short codes per source.
pub mod names {
    pub const INSTANT_VARS: [&str; 6] = ["u10", "v10", "t2m", "msl", "z", "lsm"];
    pub const ACCUM_VARS: [&str; 1] = ["tp"];
    pub const PRESSURE_VARS: [&str; 6] = ["z", "q", "t", "u", "v", "w"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_grid_steps() {
        assert_eq!(grid::ERA5_0P25.lat_step(), 0.25);
        assert_eq!(grid::ERA5_0P25.lon_step(), 0.25);
    }

    #[test]
    fn test_coarse_grid_coords() {
        let g = grid::COARSE_5X8;
        assert_eq!(g.lat_descending(), vec![90.0, 45.0, 0.0, -45.0, -90.0]);
        assert_eq!(g.lat_ascending().first(), Some(&-90.0));
        assert_eq!(g.lon().last(), Some(&315.0));
    }

    #[test]
    fn test_request_levels_descending() {
        assert!(levels::REQUEST_ORDER.windows(2).all(|w| w[0] > w[1]));
    }
}
