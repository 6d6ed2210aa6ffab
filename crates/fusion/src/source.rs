//! Raw source records as delivered by the provider.
//!
//! Names, axis order and axis direction are provider-specific here; nothing
//! is canonical until the fuser has run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use forecast_common::{PipelineError, PipelineResult, Stage};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Which of the three downloads a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    SingleInstant,
    SingleAccum,
    PressureLevels,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::SingleInstant,
        SourceKind::SingleAccum,
        SourceKind::PressureLevels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::SingleInstant => "single-instant",
            SourceKind::SingleAccum => "single-accum",
            SourceKind::PressureLevels => "pressure-level",
        }
    }

    /// Provider collection the source is retrieved from.
    pub fn collection(&self) -> &'static str {
        match self {
            SourceKind::SingleInstant | SourceKind::SingleAccum => "reanalysis-era5-single-levels",
            SourceKind::PressureLevels => "reanalysis-era5-pressure-levels",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coordinate vector under its provider name.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCoord {
    Time(Vec<DateTime<Utc>>),
    Values(Vec<f64>),
}

impl RawCoord {
    pub fn len(&self) -> usize {
        match self {
            RawCoord::Time(t) => t.len(),
            RawCoord::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A provider variable: named dimensions plus data.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub dims: Vec<String>,
    pub data: ArrayD<f32>,
    pub attrs: BTreeMap<String, String>,
}

impl RawVariable {
    pub fn new(dims: Vec<String>, data: ArrayD<f32>) -> Self {
        Self {
            dims,
            data,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

/// One provider download.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub kind: SourceKind,
    coords: BTreeMap<String, RawCoord>,
    variables: BTreeMap<String, RawVariable>,
}

impl RawDataset {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            coords: BTreeMap::new(),
            variables: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, name: impl Into<String>, times: Vec<DateTime<Utc>>) -> Self {
        self.coords.insert(name.into(), RawCoord::Time(times));
        self
    }

    pub fn with_coord(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.coords.insert(name.into(), RawCoord::Values(values));
        self
    }

    pub fn set_coord(&mut self, name: impl Into<String>, coord: RawCoord) {
        self.coords.insert(name.into(), coord);
    }

    /// Add a variable, checking rank and every labelled dimension's length.
    pub fn insert(&mut self, name: impl Into<String>, var: RawVariable) -> PipelineResult<()> {
        let name = name.into();
        if var.dims.len() != var.data.ndim() {
            return Err(PipelineError::shape(
                Stage::Load,
                name,
                vec![var.dims.len()],
                vec![var.data.ndim()],
            ));
        }
        for (dim, &len) in var.dims.iter().zip(var.data.shape()) {
            match self.coords.get(dim) {
                Some(coord) if coord.len() == len => {}
                Some(coord) => {
                    return Err(PipelineError::shape(
                        Stage::Load,
                        format!("{}.{}", name, dim),
                        vec![coord.len()],
                        vec![len],
                    ))
                }
                None => {
                    return Err(PipelineError::schema(
                        Stage::Load,
                        dim.clone(),
                        format!("variable '{}' spans a dimension without a coordinate", name),
                    ))
                }
            }
        }
        self.variables.insert(name, var);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        dims: &[&str],
        data: ArrayD<f32>,
    ) -> PipelineResult<Self> {
        let dims = dims.iter().map(|d| d.to_string()).collect();
        self.insert(name, RawVariable::new(dims, data))?;
        Ok(self)
    }

    pub fn coord(&self, name: &str) -> Option<&RawCoord> {
        self.coords.get(name)
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, &RawCoord)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn variable(&self, name: &str) -> Option<&RawVariable> {
        self.variables.get(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<RawVariable> {
        self.variables.remove(name)
    }

    /// Consume into coordinates and variables.
    pub fn into_parts(self) -> (BTreeMap<String, RawCoord>, BTreeMap<String, RawVariable>) {
        (self.coords, self.variables)
    }

    /// The (single) time coordinate: provider name and instants.
    pub fn time_coord(&self) -> PipelineResult<(&str, &[DateTime<Utc>])> {
        let mut found = self.coords.iter().filter_map(|(name, coord)| match coord {
            RawCoord::Time(times) => Some((name.as_str(), times.as_slice())),
            RawCoord::Values(_) => None,
        });
        match (found.next(), found.next()) {
            (Some(time), None) => Ok(time),
            (None, _) => Err(PipelineError::schema(
                Stage::Load,
                self.kind.as_str(),
                "source has no time coordinate",
            )),
            (Some(_), Some(_)) => Err(PipelineError::schema(
                Stage::Load,
                self.kind.as_str(),
                "source has more than one time coordinate",
            )),
        }
    }
}
