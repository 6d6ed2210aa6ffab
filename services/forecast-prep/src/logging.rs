use tracing_subscriber::EnvFilter;

/// Workspace crates that receive the CLI log level.
const CRATE_TARGETS: &[&str] = &[
    "forecast_prep",
    "forecast_common",
    "grid_dataset",
    "forcings",
    "fusion",
    "netcdf_io",
    "grid_compare",
];

/// Initialize tracing at `level` for the workspace crates.
///
/// `RUST_LOG` overrides the level if set. `json` switches to one JSON object
/// per line.
pub fn init(level: &str, json: bool) {
    let default_filter: String = CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
