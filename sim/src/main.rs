//! DRIFT SIM: uncertainty propagation for dead-reckoning inertial navigation.
//!
//! Without external position fixes an INS accumulates error: gyroscope drift corrupts the
//! orientation estimate, accelerometer bias corrupts the velocity estimate and both are
//! integrated into position. This program propagates those error sources through the chain
//! orientation -> velocity -> position for each Cartesian axis over a recalibration cycle,
//! replicates the cycle over a patrol, and reports when the position uncertainty first exceeds
//! a set of thresholds.
//!
//! You can run simulations either by:
//!   1. Loading all parameters from a configuration file (TOML/JSON/YAML)
//!   2. Using the baseline scenario and overriding parameters via command-line flags

mod common;
mod report;

use clap::{Args, Parser, Subcommand};
use common::{init_logger, parse_log_level, validate_output_dir};
use drift::Axis;
use drift::sim::{SimulationConfig, run_simulation};
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;

const LONG_ABOUT: &str =
    "DRIFT SIM: uncertainty propagation for dead-reckoning inertial navigation.

Gyroscope drift and accelerometer bias are propagated through the chain
orientation -> velocity -> position for each Cartesian axis. One recalibration
cycle is simulated by integrating the position uncertainty over fixed-width
windows; the cycle is then repeated over the patrol.

The run writes, into the output directory:
  patrol_<axis>.csv      uncertainty over the whole patrol
  crossings.csv          first window in which each threshold is exceeded
  exceedance_<axis>.csv  fraction of the patrol spent at or above each error level

You can run simulations either by:
  1. Loading all parameters from a configuration file (TOML/JSON/YAML)
  2. Using the baseline scenario and overriding parameters via command-line flags";

const DEFAULT_OUTPUT_DIR: &str = "drift_output";

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about = "Uncertainty propagation for dead-reckoning inertial navigation.", long_about = LONG_ABOUT)]
struct Cli {
    /// Simulation configuration file (TOML/JSON/YAML); the baseline scenario is used if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Log level (off, error, warn, info, debug, trace); overrides the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log file path (if not specified, logs to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Simulate axes concurrently and integrate windows in parallel
    #[arg(long, global = true)]
    parallel: bool,
}

/// Top-level commands
#[derive(Subcommand, Clone)]
enum Command {
    #[command(
        name = "run",
        about = "Run the uncertainty simulation",
        long_about = "Simulate one recalibration cycle per axis, replicate it over the patrol and write the patrol, threshold crossing and exceedance tables to the output directory."
    )]
    Run(RunArgs),

    #[command(name = "config", about = "Generate a template configuration file")]
    CreateConfig(CreateConfigArgs),
}

/// Overrides applied on top of the configuration file or the baseline
#[derive(Args, Clone, Debug, Default)]
struct RunArgs {
    /// Output directory for CSV results
    #[arg(short, long, value_parser)]
    output: Option<PathBuf>,

    /// Axes to simulate (comma separated or repeated)
    #[arg(long, value_enum, value_delimiter = ',')]
    axis: Vec<Axis>,

    /// Window width in seconds for every selected axis
    #[arg(long)]
    sample_width: Option<f64>,

    /// Number of windows per recalibration cycle for every selected axis
    #[arg(long)]
    sample_count: Option<usize>,

    /// Number of cycles per patrol for every selected axis
    #[arg(long)]
    repeat_count: Option<usize>,

    /// Position uncertainty thresholds in meters (comma separated)
    #[arg(long, value_delimiter = ',')]
    thresholds: Vec<f64>,

    /// Number of bins in the exceedance distribution
    #[arg(long, default_value_t = report::DEFAULT_BINS)]
    bins: usize,
}

#[derive(Args, Clone, Debug)]
struct CreateConfigArgs {
    /// Output file path; the format is chosen by extension (.toml, .json, .yaml, .yml)
    #[arg(short, long, value_parser, default_value = "drift.toml")]
    output: PathBuf,
}

/// Apply command line overrides to a loaded configuration.
fn apply_overrides(config: &mut SimulationConfig, args: &RunArgs, parallel: bool) {
    if !args.axis.is_empty() {
        config.axes = args.axis.clone();
    }
    if parallel {
        config.parallel = true;
    }
    if let Some(output) = &args.output {
        config.output = Some(output.display().to_string());
    }
    for axis in config.axes.clone() {
        let axis_config = config.axis_config_mut(axis);
        if let Some(width) = args.sample_width {
            axis_config.sample_width_s = width;
        }
        if let Some(count) = args.sample_count {
            axis_config.sample_count = count;
        }
        if let Some(repeat) = args.repeat_count {
            axis_config.repeat_count = repeat;
        }
        if !args.thresholds.is_empty() {
            axis_config.thresholds_m = args.thresholds.clone();
        }
    }
}

fn run(mut config: SimulationConfig, args: &RunArgs, parallel: bool) -> Result<(), Box<dyn Error>> {
    apply_overrides(&mut config, args, parallel);
    let output = config
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    validate_output_dir(&output)?;

    let results = run_simulation(&config)?;
    for axis_report in &results.reports {
        report::log_milestones(axis_report);
    }

    let mut written = results.write_to_dir(&output)?;
    for axis_report in &results.reports {
        let values: Vec<f64> = axis_report.patrol.values().collect();
        let distribution = report::exceedance_distribution(&values, args.bins);
        if distribution.is_empty() {
            warn!("{} patrol has no samples to bin", axis_report.axis());
            continue;
        }
        let path = output.join(format!("exceedance_{}.csv", axis_report.axis().label()));
        report::write_exceedance(&distribution, &path)?;
        written.push(path);
    }
    for path in &written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn create_config_file(args: &CreateConfigArgs) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    SimulationConfig::default().to_file(&args.output)?;
    info!("Template configuration written to {}", args.output.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };

    // CLI flags take precedence over the logging preferences stored in the config
    let level = match &cli.log_level {
        Some(level) => parse_log_level(level)?,
        None => parse_log_level(config.logging.level.as_str())?,
    };
    let config_log_file = config.logging.file.as_ref().map(PathBuf::from);
    let log_file = cli.log_file.as_ref().or(config_log_file.as_ref());
    init_logger(level, log_file.map(PathBuf::as_path))?;

    match cli.command {
        Some(Command::Run(args)) => run(config, &args, cli.parallel),
        Some(Command::CreateConfig(args)) => create_config_file(&args),
        None if cli.config.is_some() => run(config, &RunArgs::default_bins(), cli.parallel),
        None => {
            eprintln!("Error: No command provided. Use -h or --help for usage information.");
            std::process::exit(1);
        }
    }
}

impl RunArgs {
    fn default_bins() -> Self {
        RunArgs {
            bins: report::DEFAULT_BINS,
            ..RunArgs::default()
        }
    }
}
