//! Configuration for the forecast-prep CLI.
//!
//! Settings come from an optional YAML file; `FORECAST_PREP_*` environment
//! variables (also read from `.env`) override individual entries.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use forecast_common::{parse_iso8601, LatLonGrid};
use fusion::FusionConfig;
use grid_compare::CompareConfig;
use serde::{Deserialize, Serialize};

/// Local paths of the provider downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub single_instant: PathBuf,
    pub single_accum: PathBuf,
    pub pressure_levels: PathBuf,
    pub radiation_table: PathBuf,
}

impl SourcePaths {
    /// The file names the retrieve jobs write into `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            single_instant: dir.join("single-instant.nc"),
            single_accum: dir.join("single-accum.nc"),
            pressure_levels: dir.join("pressure-level.nc"),
            radiation_table: dir.join("toa.nc"),
        }
    }
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self::in_dir(Path::new("download"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub sources: SourcePaths,
    /// Variable holding the radiation table inside `sources.radiation_table`.
    pub radiation_variable: String,
    pub output_dir: PathBuf,
    /// Grid spacing in degrees.
    pub grid_resolution: f64,
    pub fusion: FusionConfig,
    pub compare: CompareConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            sources: SourcePaths::default(),
            radiation_variable: netcdf_io::RADIATION_VAR.to_string(),
            output_dir: PathBuf::from("output"),
            grid_resolution: 0.25,
            fusion: FusionConfig::default(),
            compare: CompareConfig::default(),
        }
    }
}

impl PrepConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load from `path` when it exists, fall back to defaults otherwise, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FORECAST_PREP_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("FORECAST_PREP_SOURCE_DIR") {
            self.sources = SourcePaths::in_dir(Path::new(&v));
        }
        if let Some(v) = lookup("FORECAST_PREP_SINGLE_INSTANT") {
            self.sources.single_instant = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORECAST_PREP_SINGLE_ACCUM") {
            self.sources.single_accum = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORECAST_PREP_PRESSURE_LEVELS") {
            self.sources.pressure_levels = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORECAST_PREP_RADIATION_TABLE") {
            self.sources.radiation_table = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORECAST_PREP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORECAST_PREP_GRID_RESOLUTION") {
            self.grid_resolution = v
                .parse()
                .with_context(|| format!("FORECAST_PREP_GRID_RESOLUTION: {:?}", v))?;
        }
        if let Some(v) = lookup("FORECAST_PREP_INIT_TIME") {
            let init: DateTime<Utc> = parse_iso8601(&v)
                .with_context(|| format!("FORECAST_PREP_INIT_TIME: {:?}", v))?;
            self.fusion.init_time = Some(init);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let r = self.grid_resolution;
        if !(r > 0.0 && r <= 90.0) {
            bail!("grid_resolution must be in (0, 90], got {}", r);
        }
        let per_circle = 360.0 / r;
        if (per_circle - per_circle.round()).abs() > 1e-6 {
            bail!("grid_resolution {} does not divide 360 degrees", r);
        }
        self.fusion.validate()?;
        Ok(())
    }

    pub fn grid(&self) -> LatLonGrid {
        LatLonGrid::global(self.grid_resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PrepConfig::default();
        assert_eq!(config.sources.radiation_table, Path::new("download/toa.nc"));
        assert_eq!(config.grid(), LatLonGrid::new(721, 1440));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "grid_resolution: 1.0\nfusion:\n  accumulation_window: 3\ncompare:\n  policy: permissive"
        )
        .unwrap();

        let config = PrepConfig::from_file(file.path()).unwrap();
        assert_eq!(config.grid(), LatLonGrid::new(181, 360));
        assert_eq!(config.fusion.accumulation_window, 3);
        assert_eq!(config.fusion.step_hours, 6);
        assert_eq!(config.compare.policy, grid_compare::MismatchPolicy::Permissive);
        assert_eq!(config.output_dir, Path::new("output"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FORECAST_PREP_SOURCE_DIR", "/data/era5"),
            ("FORECAST_PREP_RADIATION_TABLE", "/data/toa-2023.nc"),
            ("FORECAST_PREP_INIT_TIME", "2024-07-21T18:00:00Z"),
        ]
        .into_iter()
        .collect();

        let mut config = PrepConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.sources.single_accum, Path::new("/data/era5/single-accum.nc"));
        assert_eq!(config.sources.radiation_table, Path::new("/data/toa-2023.nc"));
        assert_eq!(
            config.fusion.init_time,
            Some(parse_iso8601("2024-07-21T18:00:00Z").unwrap())
        );
    }

    #[test]
    fn test_bad_resolution() {
        let mut config = PrepConfig::default();
        config
            .apply_overrides(|key| (key == "FORECAST_PREP_GRID_RESOLUTION").then(|| "0.7".to_string()))
            .unwrap();
        assert!(config.validate().is_err());

        let mut config = PrepConfig::default();
        let err = config.apply_overrides(|key| {
            (key == "FORECAST_PREP_GRID_RESOLUTION").then(|| "fine".to_string())
        });
        assert!(err.is_err());
    }
}
