//! Forecast preparation CLI.
//!
//! Fuses raw reanalysis downloads into model inputs, writes the target and
//! forcing templates, prints provider requests and compares archived
//! forecasts against reference series.

mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use config::PrepConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.json_logs);
    netcdf_io::silence_hdf5_errors();

    let config = PrepConfig::load(&cli.config)?;
    info!(
        config = %cli.config.display(),
        nlat = config.grid().nlat,
        nlon = config.grid().nlon,
        "Loaded configuration"
    );

    match &cli.command {
        Command::Requests(args) => commands::requests(&config, args)?,
        Command::Inputs(args) => commands::inputs(&config, args).await?,
        Command::Targets(args) => commands::targets(&config, args)?,
        Command::Forcings(args) => commands::forcings(&config, args).await?,
        Command::Compare(args) => {
            commands::compare(&config, args).await?;
        }
    }

    Ok(())
}
