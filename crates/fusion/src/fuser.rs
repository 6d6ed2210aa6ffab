//! The Grid Dataset Fuser.
//!
//! Merges the three raw downloads into one canonical model-input dataset:
//!
//! 1. sum the accumulated source into windows matching the instantaneous
//!    time axis, then merge it into the instantaneous source, aligning its
//!    spatial coordinates by label
//! 2. rename variables and axes through the fixed tables, dropping provider
//!    metadata
//! 3. permute every field into canonical axis order and prepend `batch`
//! 4. coerce `lat`/`lon` to `f32` and `level` to `i32`
//! 5. sort `lat`, `level` and `lon` ascending within each source
//! 6. merge single-level and pressure-level fields, requiring identical
//!    time, lat and lon axes
//! 7. attach calendar features and solar forcing
//! 8. collapse static fields and validate against the canonical schema
//!
//! Sources may deliver their axes in either direction; the grids are only
//! compared once sorted, and radiation rows are always matched against
//! ascending latitudes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use forecast_common::{
    coords_match, format_offset, ForecastClock, PipelineError, PipelineResult, Stage,
};
use grid_dataset::{ascending_order, Axis, CanonicalSchema, Coordinates, Dataset, Field};
use ndarray::{Axis as NdAxis, IxDyn};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::accumulate::accumulate_windows;
use crate::context::PipelineContext;
use crate::features::{attach_calendar, attach_solar};
use crate::source::{RawCoord, RawDataset, RawVariable, SourceKind};
use crate::tables::{rename_axis, rename_variable};

/// The three provider downloads for one initialization.
#[derive(Debug, Clone)]
pub struct RawSources {
    pub single_instant: RawDataset,
    pub single_accum: RawDataset,
    pub pressure_levels: RawDataset,
}

/// One source after renaming, before merging.
struct AlignedSource {
    times: Vec<DateTime<Utc>>,
    lat: Vec<f32>,
    lon: Vec<f32>,
    level: Option<Vec<i32>>,
    fields: Vec<(String, Field)>,
}

impl AlignedSource {
    /// Sort `lat`, `level` and `lon` ascending, permuting every field.
    fn sort_axes(&mut self) {
        if let Some(order) = ascending_order(&self.lat, |a, b| a.total_cmp(b)) {
            self.lat = order.iter().map(|&i| self.lat[i]).collect();
            self.reorder(Axis::Lat, &order);
        }
        if let Some(order) = ascending_order(&self.lon, |a, b| a.total_cmp(b)) {
            self.lon = order.iter().map(|&i| self.lon[i]).collect();
            self.reorder(Axis::Lon, &order);
        }
        let level_order = self
            .level
            .as_deref()
            .and_then(|level| ascending_order(level, |a, b| a.cmp(b)));
        if let (Some(order), Some(level)) = (level_order, self.level.as_mut()) {
            *level = order.iter().map(|&i| level[i]).collect();
            self.reorder(Axis::Level, &order);
        }
    }

    fn reorder(&mut self, axis: Axis, order: &[usize]) {
        debug!(axis = %axis, len = order.len(), "Reordering source axis ascending");
        self.fields
            .par_iter_mut()
            .for_each(|(_, field)| field.reorder(axis, order));
    }
}

/// Builds model-input datasets from raw sources.
pub struct Fuser<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> Fuser<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Fuse the raw sources into a validated model-input dataset.
    ///
    /// Any failure aborts the whole run; no partial dataset is returned.
    pub fn fuse(&self, sources: RawSources) -> PipelineResult<Dataset> {
        let RawSources {
            single_instant,
            single_accum,
            pressure_levels,
        } = sources;
        expect_kind(&single_instant, SourceKind::SingleInstant)?;
        expect_kind(&single_accum, SourceKind::SingleAccum)?;
        expect_kind(&pressure_levels, SourceKind::PressureLevels)?;

        let windowed = self.window_accumulated(single_accum)?;
        let single = merge_accumulated(single_instant, windowed)?;

        let single = self.align(single)?;
        let pressure = self.align(pressure_levels)?;
        let (mut ds, times) = self.merge(single, pressure)?;

        self.attach_features(&mut ds, &times)?;

        let config = self.ctx.config();
        let statics: Vec<String> = ds
            .names()
            .filter(|name| config.is_static(name))
            .map(String::from)
            .collect();
        for name in &statics {
            ds.collapse_static(name).map_err(|e| e.at(Stage::Fuse))?;
        }

        ds.validate(&CanonicalSchema::model_inputs(Some(*self.ctx.grid())))
            .map_err(|e| e.at(Stage::Fuse))?;

        info!(
            fields = ds.len(),
            offsets = ?ds.coords().time.iter().map(format_offset).collect::<Vec<_>>(),
            init = ?ds.reference_time,
            "Fused model inputs"
        );
        Ok(ds)
    }

    /// Window every accumulated variable along the source's time axis.
    fn window_accumulated(&self, accum: RawDataset) -> PipelineResult<RawDataset> {
        let config = self.ctx.config();
        let window = config.accumulation_window;
        let kind = accum.kind;

        let (time_name, times) = accum.time_coord()?;
        let time_name = time_name.to_string();
        let times = times.to_vec();

        let (coords, variables) = accum.into_parts();
        let mut windowed = Vec::with_capacity(variables.len());
        let mut labels = None;

        for (name, var) in variables {
            if config.is_dropped(&name) {
                debug!(source = %kind, variable = %name, "Dropping provider metadata");
                continue;
            }
            let axis = var.dim_index(&time_name).ok_or_else(|| {
                PipelineError::schema(
                    Stage::Fuse,
                    name.clone(),
                    "accumulated variable has no time dimension",
                )
            })?;
            let (window_labels, data) =
                accumulate_windows(&name, &times, &var.data, axis, window)?;
            debug!(
                variable = %name,
                samples = times.len(),
                windows = window_labels.len(),
                window,
                "Accumulated windows"
            );
            labels = Some(window_labels);
            windowed.push((
                name,
                RawVariable {
                    dims: var.dims,
                    data,
                    attrs: var.attrs,
                },
            ));
        }

        let labels = labels.ok_or_else(|| {
            PipelineError::schema(Stage::Fuse, kind.as_str(), "no accumulated variables")
        })?;

        let mut out = RawDataset::new(kind);
        for (name, coord) in coords {
            if name != time_name {
                out.set_coord(name, coord);
            }
        }
        out.set_coord(time_name, RawCoord::Time(labels));
        for (name, var) in windowed {
            out.insert(name, var)?;
        }
        Ok(out)
    }

    /// Rename one source into canonical fields, in parallel per variable.
    fn align(&self, src: RawDataset) -> PipelineResult<AlignedSource> {
        let config = self.ctx.config();
        let kind = src.kind;
        let (coords, variables) = src.into_parts();

        let mut times = None;
        let mut lat = None;
        let mut lon = None;
        let mut level = None;
        let mut dim_axes: HashMap<String, Axis> = HashMap::with_capacity(coords.len());

        for (name, coord) in coords {
            let axis = rename_axis(&name)?;
            match (axis, coord) {
                (Axis::Time, RawCoord::Time(t)) => times = Some(t),
                (Axis::Lat, RawCoord::Values(v)) => lat = Some(to_f32(&v)),
                (Axis::Lon, RawCoord::Values(v)) => lon = Some(wrap_lon(&v)),
                (Axis::Level, RawCoord::Values(v)) => level = Some(to_levels(&v)?),
                (axis, _) => {
                    return Err(PipelineError::schema(
                        Stage::Fuse,
                        name,
                        format!("coordinate cannot serve as the '{}' axis", axis),
                    ))
                }
            }
            dim_axes.insert(name, axis);
        }

        let missing = |axis: &str| {
            PipelineError::schema(
                Stage::Fuse,
                axis,
                format!("{} source has no such coordinate", kind),
            )
        };
        let times = times.ok_or_else(|| missing("time"))?;
        let lat = lat.ok_or_else(|| missing("lat"))?;
        let lon = lon.ok_or_else(|| missing("lon"))?;
        if kind == SourceKind::PressureLevels && level.is_none() {
            return Err(missing("level"));
        }

        let dropped = variables.keys().filter(|name| config.is_dropped(name)).count();
        if dropped > 0 {
            debug!(source = %kind, dropped, "Dropping provider metadata");
        }

        let fields = variables
            .into_par_iter()
            .filter(|(name, _)| !config.is_dropped(name))
            .map(|(code, var)| to_field(kind, &code, var, &dim_axes))
            .collect::<PipelineResult<Vec<_>>>()?;

        debug!(source = %kind, fields = fields.len(), "Renamed source");

        let mut aligned = AlignedSource {
            times,
            lat,
            lon,
            level,
            fields,
        };
        aligned.sort_axes();
        Ok(aligned)
    }

    /// Merge the aligned sources into one dataset on the shared axes.
    fn merge(
        &self,
        single: AlignedSource,
        pressure: AlignedSource,
    ) -> PipelineResult<(Dataset, Vec<DateTime<Utc>>)> {
        if single.times.len() != pressure.times.len() {
            return Err(PipelineError::shape(
                Stage::Fuse,
                "time",
                vec![single.times.len()],
                vec![pressure.times.len()],
            ));
        }
        if single.times != pressure.times {
            return Err(PipelineError::coordinate(
                Stage::Fuse,
                "time",
                "single-level and pressure-level instants differ",
            ));
        }
        check_axis("lat", &single.lat, &pressure.lat)?;
        check_axis("lon", &single.lon, &pressure.lon)?;

        let times = single.times;
        let clock = match self.ctx.config().init_time {
            Some(init) => ForecastClock::new(init),
            None => ForecastClock::at_last(&times).ok_or_else(|| {
                PipelineError::insufficient(Stage::Fuse, "time", "sources carry no time steps")
            })?,
        };

        let coords = Coordinates::new(
            clock.offsets(&times),
            pressure.level.or(single.level),
            single.lat,
            single.lon,
        );
        let mut ds = Dataset::new(coords).with_reference_time(clock.init);

        for (name, field) in single.fields.into_iter().chain(pressure.fields) {
            if ds.contains(&name) {
                return Err(PipelineError::schema(
                    Stage::Fuse,
                    name,
                    "field provided by more than one source",
                ));
            }
            ds.insert(name, field).map_err(|e| e.at(Stage::Fuse))?;
        }

        debug!(fields = ds.len(), init = %clock.init, "Merged sources");
        Ok((ds, times))
    }

    fn attach_features(&self, ds: &mut Dataset, times: &[DateTime<Utc>]) -> PipelineResult<()> {
        let features = forcings::encode(times);
        attach_calendar(ds, &features, Stage::Calendar)?;

        let toa = {
            let coords = ds.coords();
            self.ctx.solar().resolve(times, &coords.lat, &coords.lon)?
        };
        attach_solar(ds, toa, Stage::Solar)
    }
}

fn expect_kind(src: &RawDataset, kind: SourceKind) -> PipelineResult<()> {
    if src.kind == kind {
        Ok(())
    } else {
        Err(PipelineError::schema(
            Stage::Fuse,
            src.kind.as_str(),
            format!("expected a {} source", kind),
        ))
    }
}

/// Move the windowed accumulated variables into the instantaneous source.
fn merge_accumulated(mut instant: RawDataset, accum: RawDataset) -> PipelineResult<RawDataset> {
    let (instant_time, instant_times) = instant.time_coord()?;
    let (accum_time, accum_times) = accum.time_coord()?;

    if instant_times.len() != accum_times.len() {
        return Err(PipelineError::shape(
            Stage::Fuse,
            "total_precipitation_6hr.time",
            vec![instant_times.len()],
            vec![accum_times.len()],
        ));
    }
    if instant_times != accum_times {
        return Err(PipelineError::coordinate(
            Stage::Fuse,
            "time",
            "accumulation windows do not end at the instantaneous times",
        ));
    }
    let instant_time = instant_time.to_string();
    let accum_time = accum_time.to_string();

    let mut reorders = Vec::new();
    for (name, coord) in accum.coords() {
        if name == accum_time {
            continue;
        }
        let order = match (instant.coord(name), coord) {
            (Some(RawCoord::Values(ours)), RawCoord::Values(theirs)) => label_order(ours, theirs),
            (Some(_), _) => None,
            (None, _) => {
                return Err(PipelineError::schema(
                    Stage::Fuse,
                    name,
                    "coordinate missing from the instantaneous source",
                ))
            }
        };
        match order {
            Some(order) if order.iter().enumerate().all(|(i, &j)| i == j) => {}
            Some(order) => reorders.push((name.to_string(), order)),
            None => {
                return Err(PipelineError::coordinate(
                    Stage::Fuse,
                    name,
                    "accumulated and instantaneous sources disagree",
                ))
            }
        }
    }

    let (_, variables) = accum.into_parts();
    for (name, mut var) in variables {
        if instant.variable(&name).is_some() {
            return Err(PipelineError::schema(
                Stage::Fuse,
                name,
                "variable present in both single-level sources",
            ));
        }
        for (dim, order) in &reorders {
            if let Some(axis) = var.dim_index(dim) {
                var.data = var.data.select(NdAxis(axis), order);
            }
        }
        for dim in var.dims.iter_mut() {
            if *dim == accum_time {
                *dim = instant_time.clone();
            }
        }
        instant.insert(name, var)?;
    }
    Ok(instant)
}

/// Rename one provider variable and bring it into canonical axis order.
fn to_field(
    kind: SourceKind,
    code: &str,
    var: RawVariable,
    dim_axes: &HashMap<String, Axis>,
) -> PipelineResult<(String, Field)> {
    let name = rename_variable(kind, code)?;
    let RawVariable { dims, data, attrs } = var;

    let axes = dims
        .iter()
        .map(|dim| {
            dim_axes.get(dim).copied().ok_or_else(|| {
                PipelineError::schema(
                    Stage::Fuse,
                    dim.clone(),
                    format!("variable '{}' spans an unknown dimension", code),
                )
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..axes.len()).collect();
    order.sort_by_key(|&i| axes[i]);
    if order.windows(2).any(|w| axes[w[0]] == axes[w[1]]) {
        return Err(PipelineError::schema(
            Stage::Fuse,
            name,
            "variable spans the same axis twice",
        ));
    }

    let in_order = order.iter().enumerate().all(|(i, &o)| i == o);
    let data = if in_order {
        data
    } else {
        data.permuted_axes(IxDyn(&order))
            .as_standard_layout()
            .into_owned()
    };
    let axes = order.iter().map(|&i| axes[i]).collect();

    let mut field = Field::new(axes, data)
        .and_then(Field::insert_batch)
        .map_err(|e| e.at(Stage::Fuse))?;
    field.attrs.extend(attrs);

    Ok((name.to_string(), field))
}

/// For each of `ours`, the index of the matching label in `theirs`, when
/// `theirs` holds the same labels in some order.
fn label_order(ours: &[f64], theirs: &[f64]) -> Option<Vec<usize>> {
    if ours.len() != theirs.len() {
        return None;
    }
    let mut used = vec![false; theirs.len()];
    ours.iter()
        .map(|a| {
            let j = (0..theirs.len()).find(|&j| !used[j] && (a - theirs[j]).abs() < 1e-6)?;
            used[j] = true;
            Some(j)
        })
        .collect()
}

fn check_axis(axis: &str, ours: &[f32], theirs: &[f32]) -> PipelineResult<()> {
    if ours.len() != theirs.len() {
        return Err(PipelineError::shape(
            Stage::Fuse,
            axis,
            vec![ours.len()],
            vec![theirs.len()],
        ));
    }
    if !coords_match(ours, theirs) {
        return Err(PipelineError::coordinate(
            Stage::Fuse,
            axis,
            "single-level and pressure-level grids differ",
        ));
    }
    Ok(())
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

/// Longitudes folded into `[0, 360)`.
fn wrap_lon(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v.rem_euclid(360.0) as f32).collect()
}

fn to_levels(values: &[f64]) -> PipelineResult<Vec<i32>> {
    values
        .iter()
        .map(|&v| {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(v as i32)
            } else {
                Err(PipelineError::coordinate(
                    Stage::Fuse,
                    "level",
                    format!("pressure level {} is not a whole hPa value", v),
                ))
            }
        })
        .collect()
}
