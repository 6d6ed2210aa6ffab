//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use forecast_common::parse_iso8601;
use fusion::{
    forcing_template, target_template, PipelineContext, RawDataset, RawSources, RetrieveJob,
    SourceKind,
};
use grid_compare::{Comparator, CompareConfig, Comparison};
use grid_dataset::Dataset;
use netcdf_io::{
    read_archive_series, read_grid_series, read_raw_source, read_solar_table, NetCdfResult,
};
use serde::Serialize;
use tracing::info;

use crate::cli::{CompareArgs, ForcingsArgs, OutputArgs, RequestsArgs, TargetsArgs};
use crate::config::PrepConfig;

/// Verification series variables.
const VERIFICATION_VARS: &[&str] = &["2m_temperature"];

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[derive(Serialize)]
struct RequestPlan {
    inputs: Vec<RetrieveJob>,
    radiation_table: RetrieveJob,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<RetrieveJob>,
}

pub fn requests(config: &PrepConfig, args: &RequestsArgs) -> Result<()> {
    let window = config.fusion.accumulation_window as u32;
    let days = args.date.day()..=last_day_of_month(args.date);

    let plan = RequestPlan {
        inputs: RetrieveJob::inputs(args.date, &args.hours, window, &args.dir)?,
        radiation_table: RetrieveJob::radiation_table(
            args.date.year(),
            args.date.month(),
            days.clone(),
            &args.dir,
        ),
        verification: args.verification.then(|| {
            RetrieveJob::verification_series(
                VERIFICATION_VARS,
                args.date.year(),
                args.date.month(),
                days,
                &args.dir,
            )
        }),
    };

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Run a blocking NetCDF read on the blocking pool.
async fn blocking<T, F>(what: String, read: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> NetCdfResult<T> + Send + 'static,
{
    let value = tokio::task::spawn_blocking(read)
        .await
        .with_context(|| format!("{} task failed", what))?
        .with_context(|| what)?;
    Ok(value)
}

async fn load_source(path: PathBuf, kind: SourceKind) -> Result<RawDataset> {
    let what = format!("loading {} source from {}", kind.as_str(), path.display());
    blocking(what, move || read_raw_source(&path, kind)).await
}

async fn load_context(config: &PrepConfig) -> Result<PipelineContext> {
    let path = config.sources.radiation_table.clone();
    let var = config.radiation_variable.clone();
    let what = format!("loading radiation table from {}", path.display());
    let table = blocking(what, move || read_solar_table(&path, &var)).await?;
    Ok(PipelineContext::new(config.fusion.clone(), config.grid(), table)?)
}

fn output_path(config: &PrepConfig, args: &OutputArgs, name: &str) -> Result<PathBuf> {
    if let Some(path) = &args.output {
        return Ok(path.clone());
    }
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("creating output directory {}", config.output_dir.display())
    })?;
    Ok(config.output_dir.join(format!("{}.nc", name)))
}

fn save(ds: &Dataset, path: &Path) -> Result<()> {
    netcdf_io::write_dataset(ds, path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), fields = ds.len(), "Wrote dataset");
    Ok(())
}

pub async fn inputs(config: &PrepConfig, args: &OutputArgs) -> Result<()> {
    let sources = &config.sources;
    let (ctx, single_instant, single_accum, pressure_levels) = tokio::try_join!(
        load_context(config),
        load_source(sources.single_instant.clone(), SourceKind::SingleInstant),
        load_source(sources.single_accum.clone(), SourceKind::SingleAccum),
        load_source(sources.pressure_levels.clone(), SourceKind::PressureLevels),
    )?;

    let ds = ctx.fuser().fuse(RawSources {
        single_instant,
        single_accum,
        pressure_levels,
    })?;
    save(&ds, &output_path(config, args, "inputs")?)
}

pub fn targets(config: &PrepConfig, args: &TargetsArgs) -> Result<()> {
    let ds = target_template(&config.fusion, &config.grid(), args.steps)?;
    save(&ds, &output_path(config, &args.output, "targets")?)
}

pub async fn forcings(config: &PrepConfig, args: &ForcingsArgs) -> Result<()> {
    let start = parse_iso8601(&args.start).with_context(|| format!("--start {:?}", args.start))?;
    let ctx = load_context(config).await?;
    let ds = forcing_template(&ctx, start, args.steps)?;
    save(&ds, &output_path(config, &args.output, "forcings")?)
}

pub async fn compare(config: &PrepConfig, args: &CompareArgs) -> Result<Comparison> {
    let predicted_path = args.predicted.clone();
    let predicted_var = args.predicted_var.clone();
    let channel = args.channel;
    let reference_path = args.reference.clone();
    let reference_var = args.reference_var.clone();

    let (predicted, reference) = tokio::try_join!(
        blocking(
            format!("loading predicted archive {}", args.predicted.display()),
            move || read_archive_series(&predicted_path, &predicted_var, channel),
        ),
        blocking(
            format!("loading reference series {}", args.reference.display()),
            move || read_grid_series(&reference_path, &reference_var),
        ),
    )?;

    let compare_config = match args.archive_steps {
        Some(steps) => CompareConfig::archive_vs_reanalysis(steps),
        None => config.compare.clone(),
    };
    let result =
        Comparator::new(compare_config).compare(predicted.view(), reference.values.view())?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result)
}
