use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "forecast-prep")]
#[command(version, about = "Prepare reanalysis inputs, templates and verification reports")]
pub struct Cli {
    /// Configuration file path (defaults apply when it does not exist)
    #[arg(
        short,
        long,
        global = true,
        default_value = "forecast-prep.yaml",
        env = "FORECAST_PREP_CONFIG"
    )]
    pub config: PathBuf,

    /// Log level for workspace crates (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the provider requests for one initialization day
    Requests(RequestsArgs),
    /// Fuse the raw downloads into the model-input dataset
    Inputs(OutputArgs),
    /// Write the target template
    Targets(TargetsArgs),
    /// Write the forcing template
    Forcings(ForcingsArgs),
    /// Compare an archived forecast against a reference series
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
pub struct RequestsArgs {
    /// Initialization day
    #[arg(long)]
    pub date: NaiveDate,

    /// Input hours, ascending
    #[arg(long, value_delimiter = ',', default_values_t = [12u32, 18])]
    pub hours: Vec<u32>,

    /// Directory the downloads are written to
    #[arg(long, default_value = "download")]
    pub dir: PathBuf,

    /// Also request an hourly 2m temperature series from `date` to month end
    #[arg(long)]
    pub verification: bool,
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Output file (default: <output_dir>/<command>.nc)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct TargetsArgs {
    /// Number of forecast steps
    #[arg(long, default_value_t = 1)]
    pub steps: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
pub struct ForcingsArgs {
    /// First forecast valid time (ISO 8601, UTC if no offset)
    #[arg(long)]
    pub start: String,

    /// Number of forecast steps
    #[arg(long, default_value_t = 1)]
    pub steps: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Archived forecast file
    #[arg(long)]
    pub predicted: PathBuf,

    /// Variable holding the forecast inside the archive
    #[arg(long, default_value = "forecast")]
    pub predicted_var: String,

    /// Channel of a (time, channel, lat, lon) archive
    #[arg(long, default_value_t = 0)]
    pub channel: usize,

    /// Reference gridded file
    #[arg(long)]
    pub reference: PathBuf,

    /// Variable holding the reference series
    #[arg(long, default_value = "t2m")]
    pub reference_var: String,

    /// Use the hourly archive-vs-reanalysis alignment over this many steps
    /// instead of the configured one
    #[arg(long)]
    pub archive_steps: Option<usize>,
}
