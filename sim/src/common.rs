//! Common utility functions for the command line runner.
//!
//! This module contains:
//! - Log level parsing and logger initialization
//! - Output path validation

use log::LevelFilter;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Parse a log level name (off, error, warn, info, debug, trace), ignoring case.
///
/// # Errors
/// Returns an error naming the accepted levels if `level` is not one of them.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, Box<dyn Error>> {
    level.parse::<LevelFilter>().map_err(|_| {
        format!("invalid log level '{level}', expected one of off, error, warn, info, debug, trace")
            .into()
    })
}

/// Initialize the logger.
///
/// Records are timestamped with local time. Output goes to `log_file` when given (appending, and
/// creating parent directories as needed), otherwise to stderr.
///
/// # Errors
/// Returns an error if the log file cannot be opened or a logger is already installed.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format(|buf, record| {
        writeln!(
            buf,
            "{} [{:<5}] {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = log_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    Ok(())
}

/// Validate that `output` can be used as a results directory.
///
/// The directory does not need to exist yet, but the path must not name an existing file.
///
/// # Errors
/// Returns an error if `output` is an existing file.
pub fn validate_output_dir(output: &Path) -> Result<(), Box<dyn Error>> {
    if output.is_file() {
        return Err(format!(
            "Output path '{}' is a file; expected a directory.",
            output.display()
        )
        .into());
    }
    Ok(())
}
