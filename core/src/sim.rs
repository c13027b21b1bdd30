//! Simulation configuration, orchestration and result export.
//!
//! This module provides:
//! - [`SimulationConfig`]: the complete input record (physical model, quadrature tolerances,
//!   per-axis sampling, logging preferences), readable and writable as TOML, JSON or YAML
//! - [`run_axis`] and [`run_simulation`]: drive the cycle simulator for one or all axes
//! - [`SimulationReport`]: per-axis cycle and patrol results plus CSV export
//!
//! Validation happens up front. A run either produces a complete cycle and patrol for every
//! requested axis or returns the first error; partial results are never returned.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::chain::UncertaintyChain;
use crate::cycle::{AxisRunConfig, CycleResult, CycleSimulator, PatrolResult, ThresholdCrossing};
use crate::quadrature::Quadrature;
use crate::{Axis, DriftError, PhysicalModel, Result};

/// Log verbosity understood by the command line runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}
impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Logging preferences stored alongside a simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    /// Log file path; logs go to stderr when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_axes() -> Vec<Axis> {
    Axis::ALL.to_vec()
}
fn default_x() -> AxisRunConfig {
    AxisRunConfig::baseline(Axis::X)
}
fn default_y() -> AxisRunConfig {
    AxisRunConfig::baseline(Axis::Y)
}
fn default_z() -> AxisRunConfig {
    AxisRunConfig::baseline(Axis::Z)
}

/// Complete description of an uncertainty simulation run.
///
/// `SimulationConfig::default()` is the baseline scenario: level cruise at 10 m/s, 10 s windows
/// over a 250 000 window cycle for X and Z, 250 one-second windows for Y, five cycles per patrol
/// and thresholds of 1, 10 and 100 m.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Axes to simulate
    #[serde(default = "default_axes")]
    pub axes: Vec<Axis>,
    /// Run axes concurrently and integrate windows in parallel
    #[serde(default)]
    pub parallel: bool,
    /// Directory for CSV output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub quadrature: Quadrature,
    #[serde(default)]
    pub model: PhysicalModel,
    #[serde(default = "default_x")]
    pub x: AxisRunConfig,
    #[serde(default = "default_y")]
    pub y: AxisRunConfig,
    #[serde(default = "default_z")]
    pub z: AxisRunConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            axes: default_axes(),
            parallel: false,
            output: None,
            logging: LoggingConfig::default(),
            quadrature: Quadrature::default(),
            model: PhysicalModel::default(),
            x: default_x(),
            y: default_y(),
            z: default_z(),
        }
    }
}

impl SimulationConfig {
    pub fn axis_config(&self, axis: Axis) -> &AxisRunConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
    pub fn axis_config_mut(&mut self, axis: Axis) -> &mut AxisRunConfig {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Check the whole configuration before any integration runs.
    pub fn validate(&self) -> Result<()> {
        if self.axes.is_empty() {
            return Err(DriftError::config("at least one axis must be selected"));
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if self.axes[..i].contains(axis) {
                return Err(DriftError::config(format!("axis {axis} selected twice")));
            }
        }
        let q = &self.quadrature;
        if !(q.abs_tolerance >= 0.0 && q.rel_tolerance >= 0.0)
            || !q.abs_tolerance.is_finite()
            || !q.rel_tolerance.is_finite()
            || (q.abs_tolerance == 0.0 && q.rel_tolerance == 0.0)
        {
            return Err(DriftError::config(format!(
                "quadrature tolerances must be finite, non-negative and not both zero, got {} / {}",
                q.abs_tolerance, q.rel_tolerance
            )));
        }
        if q.max_subdivisions == 0 {
            return Err(DriftError::config("quadrature max_subdivisions must be at least 1"));
        }
        self.model.validate()?;
        for axis in &self.axes {
            self.axis_config(*axis).validate().map_err(|e| match e {
                DriftError::Configuration(message) => {
                    DriftError::config(format!("{axis} axis: {message}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Write the configuration to a JSON file (pretty-printed).
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
    }
    /// Read the configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(io::Error::other)
    }
    /// Write the configuration as YAML.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = serde_yaml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }
    /// Read the configuration from YAML.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(file).map_err(io::Error::other)
    }
    /// Write the configuration as TOML.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = toml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }
    /// Read the configuration from TOML.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut s = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut s)?;
        toml::from_str(&s).map_err(io::Error::other)
    }
    /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let p = path.as_ref();
        match extension(p).as_deref() {
            Some("json") => self.to_json(p),
            Some("yaml") | Some("yml") => self.to_yaml(p),
            Some("toml") => self.to_toml(p),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported file extension",
            )),
        }
    }
    /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let p = path.as_ref();
        match extension(p).as_deref() {
            Some("json") => Self::from_json(p),
            Some("yaml") | Some("yml") => Self::from_yaml(p),
            Some("toml") => Self::from_toml(p),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported file extension",
            )),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Complete output for one axis.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisReport {
    pub cycle: CycleResult,
    pub patrol: PatrolResult,
}
impl AxisReport {
    pub fn axis(&self) -> Axis {
        self.cycle.axis
    }
    /// Every configured threshold paired with its first crossing, `None` if never exceeded.
    pub fn crossing_map(&self) -> Vec<(f64, Option<&ThresholdCrossing>)> {
        self.cycle
            .config
            .thresholds_m
            .iter()
            .map(|&threshold| (threshold, self.cycle.first_crossing(threshold)))
            .collect()
    }
}

/// Flattened threshold crossing row for CSV output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossingRecord {
    pub axis: Axis,
    pub threshold_m: f64,
    pub sample_index: Option<usize>,
    pub elapsed_s: Option<f64>,
}

/// Results of a run, one [`AxisReport`] per requested axis in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationReport {
    pub reports: Vec<AxisReport>,
}
impl SimulationReport {
    pub fn get(&self, axis: Axis) -> Option<&AxisReport> {
        self.reports.iter().find(|r| r.axis() == axis)
    }

    /// One row per axis and configured threshold, crossed or not.
    pub fn crossing_records(&self) -> Vec<CrossingRecord> {
        self.reports
            .iter()
            .flat_map(|report| {
                let axis = report.axis();
                report
                    .crossing_map()
                    .into_iter()
                    .map(move |(threshold_m, crossing)| CrossingRecord {
                        axis,
                        threshold_m,
                        sample_index: crossing.map(|c| c.sample_index),
                        elapsed_s: crossing.map(|c| c.elapsed_s),
                    })
            })
            .collect()
    }

    /// Write the threshold crossings to a CSV file.
    pub fn crossings_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in self.crossing_records() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `patrol_<axis>.csv` for each axis and `crossings.csv` into `dir`.
    ///
    /// # Returns
    /// The paths of the files written.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.reports.len() + 1);
        for report in &self.reports {
            let path = dir.join(format!("patrol_{}.csv", report.axis().label()));
            report.patrol.to_csv(&path)?;
            written.push(path);
        }
        let path = dir.join("crossings.csv");
        self.crossings_to_csv(&path)?;
        written.push(path);
        Ok(written)
    }
}

/// Simulate one recalibration cycle for `axis` and replicate it over the patrol.
///
/// Window integrals are computed in parallel when `config.parallel` is set.
pub fn run_axis(config: &SimulationConfig, axis: Axis) -> Result<AxisReport> {
    let axis_config = config.axis_config(axis);
    let chain = UncertaintyChain::with_quadrature(&config.model, config.quadrature);
    let simulator = CycleSimulator::new(chain, axis, axis_config)?;
    info!(
        "{axis}: simulating {} windows of {} s, {} repetitions",
        axis_config.sample_count, axis_config.sample_width_s, axis_config.repeat_count
    );
    let cycle = if config.parallel {
        simulator.run_parallel()?
    } else {
        simulator.run()?
    };
    let patrol = PatrolResult::replicate(&cycle);
    info!(
        "{axis}: cycle ends at {:.4} m, {} patrol samples over {} s",
        cycle.final_sigma().unwrap_or_default(),
        patrol.len(),
        patrol.duration_s
    );
    Ok(AxisReport { cycle, patrol })
}

/// Validate `config` and simulate every requested axis.
///
/// With `config.parallel` the axes run concurrently. Any failing axis fails the whole run.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationReport> {
    config.validate()?;
    info!("Simulating axes {:?} with {}", config.axes, config.model);
    let reports = if config.parallel {
        config
            .axes
            .par_iter()
            .map(|&axis| run_axis(config, axis))
            .collect::<Result<Vec<_>>>()?
    } else {
        config
            .axes
            .iter()
            .map(|&axis| run_axis(config, axis))
            .collect::<Result<Vec<_>>>()?
    };
    Ok(SimulationReport { reports })
}
