//! Recalibration cycles, threshold crossings and patrol replication.
//!
//! A recalibration cycle is the error growth between two external position fixes. The
//! [`CycleSimulator`] builds one cycle for one axis by walking fixed-width windows
//! `[i·Δt, (i+1)·Δt]`, integrating the positional uncertainty over each window and keeping a
//! running total. Every total is recorded as an [`UncertaintySample`] at the window's start time
//! and checked against the reporting thresholds.
//!
//! The simulator is a two-state machine (`Accumulating → Done`) that owns its accumulator and
//! output buffer, so several axes can run side by side without sharing anything but the
//! read-only model. Window integrals are independent of one another, which
//! [`CycleSimulator::run_parallel`] exploits: the integrals are computed with rayon and the
//! running total is formed afterwards as an ordered prefix sum.
//!
//! A full patrol is then a [`PatrolResult`]: the cycle's values repeated `repeat_count` times,
//! paired with an evenly spaced time axis that spans the patrol duration. The time axis is
//! generated on its own and does not restart at each repetition.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chain::UncertaintyChain;
use crate::{Axis, DriftError, Result};

/// Default reporting thresholds in meters.
pub const DEFAULT_THRESHOLDS_M: [f64; 3] = [1.0, 10.0, 100.0];
/// Default window width in seconds for the X and Z axes.
pub const DEFAULT_SAMPLE_WIDTH_S: f64 = 10.0;
/// Default number of windows in one recalibration cycle (about 28.94 days at 10 s).
pub const DEFAULT_SAMPLE_COUNT: usize = 250_000;
/// Default number of recalibration cycles in a patrol.
pub const DEFAULT_REPEAT_COUNT: usize = 5;
/// Window width for the Y axis, whose error stays at zero in the baseline.
pub const Y_SAMPLE_WIDTH_S: f64 = 1.0;
/// Window count for the Y axis.
pub const Y_SAMPLE_COUNT: usize = 250;
/// Baseline patrol length shared by every axis, seconds (140.4676 days).
pub const DEFAULT_PATROL_DURATION_S: f64 = 140.4676 * 86_400.0;

fn default_thresholds() -> Vec<f64> {
    DEFAULT_THRESHOLDS_M.to_vec()
}

/// Sampling and replication parameters for one axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRunConfig {
    /// Width of each integration window, seconds
    pub sample_width_s: f64,
    /// Number of windows in one recalibration cycle
    pub sample_count: usize,
    /// Number of recalibration cycles in the patrol
    pub repeat_count: usize,
    /// Reporting thresholds, meters
    #[serde(default = "default_thresholds")]
    pub thresholds_m: Vec<f64>,
    /// Span of the patrol time axis, seconds. Defaults to `sample_width_s * sample_count *
    /// repeat_count` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patrol_duration_s: Option<f64>,
}
impl Default for AxisRunConfig {
    fn default() -> Self {
        AxisRunConfig {
            sample_width_s: DEFAULT_SAMPLE_WIDTH_S,
            sample_count: DEFAULT_SAMPLE_COUNT,
            repeat_count: DEFAULT_REPEAT_COUNT,
            thresholds_m: default_thresholds(),
            patrol_duration_s: None,
        }
    }
}
impl AxisRunConfig {
    /// Baseline parameters for `axis`. Y uses 250 one-second windows.
    ///
    /// Every axis reports over the same [`DEFAULT_PATROL_DURATION_S`], whatever its sampling.
    pub fn baseline(axis: Axis) -> Self {
        let patrol_duration_s = Some(DEFAULT_PATROL_DURATION_S);
        match axis {
            Axis::X | Axis::Z => AxisRunConfig {
                patrol_duration_s,
                ..AxisRunConfig::default()
            },
            Axis::Y => AxisRunConfig {
                sample_width_s: Y_SAMPLE_WIDTH_S,
                sample_count: Y_SAMPLE_COUNT,
                patrol_duration_s,
                ..AxisRunConfig::default()
            },
        }
    }
    /// Length of one recalibration cycle in seconds.
    pub fn cycle_duration_s(&self) -> f64 {
        self.sample_width_s * self.sample_count as f64
    }
    /// Span of the patrol time axis in seconds.
    pub fn patrol_duration_s(&self) -> f64 {
        self.patrol_duration_s
            .unwrap_or(self.cycle_duration_s() * self.repeat_count as f64)
    }
    /// Reject nonsensical parameters before any integration runs.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_width_s.is_finite() || self.sample_width_s <= 0.0 {
            return Err(DriftError::config(format!(
                "sample_width_s must be positive and finite, got {}",
                self.sample_width_s
            )));
        }
        if self.sample_count == 0 {
            return Err(DriftError::config("sample_count must be at least 1"));
        }
        if self.repeat_count == 0 {
            return Err(DriftError::config("repeat_count must be at least 1"));
        }
        if let Some(threshold) = self.thresholds_m.iter().find(|t| !t.is_finite()) {
            return Err(DriftError::config(format!(
                "thresholds must be finite, got {threshold}"
            )));
        }
        if let Some(duration) = self.patrol_duration_s
            && (!duration.is_finite() || duration < 0.0)
        {
            return Err(DriftError::config(format!(
                "patrol_duration_s must be non-negative and finite, got {duration}"
            )));
        }
        Ok(())
    }
}

/// Accumulated standard deviation at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UncertaintySample {
    pub elapsed_s: f64,
    pub sigma_m: f64,
}

/// First sample at which the accumulated uncertainty exceeded a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    pub threshold_m: f64,
    pub sample_index: usize,
    pub elapsed_s: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleState {
    Accumulating,
    Done,
}

/// One recalibration cycle of error growth for a single axis.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleResult {
    pub axis: Axis,
    pub config: AxisRunConfig,
    /// Samples ordered by elapsed time; `sigma_m` is non-decreasing.
    pub samples: Vec<UncertaintySample>,
    /// First crossings ordered by sample index. Thresholds never exceeded are absent.
    pub crossings: Vec<ThresholdCrossing>,
}
impl CycleResult {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// First crossing of `threshold_m`, if it happened within the cycle.
    pub fn first_crossing(&self, threshold_m: f64) -> Option<&ThresholdCrossing> {
        self.crossings.iter().find(|c| c.threshold_m == threshold_m)
    }
    /// Accumulated uncertainty at the end of the cycle.
    pub fn final_sigma(&self) -> Option<f64> {
        self.samples.last().map(|s| s.sigma_m)
    }
    /// Write the cycle samples to a CSV file with an `elapsed_s,sigma_m` header.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_samples(&self.samples, path)
    }
}

/// Drives the uncertainty chain over one recalibration cycle for one axis.
#[derive(Debug)]
pub struct CycleSimulator<'a> {
    chain: UncertaintyChain<'a>,
    axis: Axis,
    config: AxisRunConfig,
    state: CycleState,
    accumulated: f64,
    samples: Vec<UncertaintySample>,
    crossings: Vec<ThresholdCrossing>,
    pending: Vec<f64>,
}

impl<'a> CycleSimulator<'a> {
    /// Create a simulator for `axis`. The accumulator starts at the model's position seed.
    ///
    /// # Errors
    /// [`DriftError::Configuration`] if `config` or the model is invalid.
    pub fn new(chain: UncertaintyChain<'a>, axis: Axis, config: &AxisRunConfig) -> Result<Self> {
        config.validate()?;
        chain.model().validate()?;
        Ok(CycleSimulator {
            chain,
            axis,
            config: config.clone(),
            state: CycleState::Accumulating,
            accumulated: chain.model().position_seed_m[axis.index()],
            samples: Vec::with_capacity(config.sample_count),
            crossings: Vec::new(),
            pending: config.thresholds_m.clone(),
        })
    }
    pub fn state(&self) -> CycleState {
        self.state
    }
    pub fn axis(&self) -> Axis {
        self.axis
    }
    /// Running total after the samples produced so far.
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
    pub fn samples(&self) -> &[UncertaintySample] {
        &self.samples
    }
    pub fn crossings(&self) -> &[ThresholdCrossing] {
        &self.crossings
    }

    /// Integrate the next window and record its sample.
    ///
    /// Calling `step` after the cycle is complete does nothing and returns [`CycleState::Done`].
    pub fn step(&mut self) -> Result<CycleState> {
        if self.state == CycleState::Done {
            return Ok(self.state);
        }
        let (start, end) = self.window(self.samples.len());
        let increment = self.chain.position_uncertainty(self.axis, start, end)?;
        self.accumulate(increment)?;
        Ok(self.state)
    }

    /// Step until the cycle is complete.
    pub fn run(mut self) -> Result<CycleResult> {
        debug!(
            "Running {} cycle sequentially: {} windows of {} s",
            self.axis, self.config.sample_count, self.config.sample_width_s
        );
        while self.step()? == CycleState::Accumulating {}
        Ok(self.finish())
    }

    /// Complete the cycle with the window integrals computed in parallel.
    ///
    /// The integrals are independent, so they are evaluated with rayon and then folded into the
    /// running total in window order. The samples are identical to those of [`run`](Self::run).
    pub fn run_parallel(mut self) -> Result<CycleResult> {
        debug!(
            "Running {} cycle in parallel: {} windows of {} s",
            self.axis, self.config.sample_count, self.config.sample_width_s
        );
        let chain = self.chain;
        let axis = self.axis;
        let width = self.config.sample_width_s;
        let increments = (self.samples.len()..self.config.sample_count)
            .into_par_iter()
            .map(|i| chain.position_uncertainty(axis, i as f64 * width, (i + 1) as f64 * width))
            .collect::<Result<Vec<f64>>>()?;
        for increment in increments {
            self.accumulate(increment)?;
        }
        Ok(self.finish())
    }

    fn window(&self, index: usize) -> (f64, f64) {
        let width = self.config.sample_width_s;
        (index as f64 * width, (index + 1) as f64 * width)
    }

    /// Add one window integral to the running total, record the sample and check thresholds.
    fn accumulate(&mut self, increment: f64) -> Result<()> {
        let index = self.samples.len();
        let previous = self.accumulated;
        let current = previous + increment;
        // also rejects NaN
        if !(current >= previous) {
            return Err(DriftError::InvariantViolation {
                axis: self.axis,
                index,
                previous,
                current,
            });
        }
        self.accumulated = current;
        let elapsed_s = self.window(index).0;
        self.samples.push(UncertaintySample {
            elapsed_s,
            sigma_m: current,
        });

        let axis = self.axis;
        let crossings = &mut self.crossings;
        self.pending.retain(|&threshold_m| {
            if current > threshold_m {
                debug!("{axis} uncertainty exceeded {threshold_m} m at {elapsed_s} s (sample {index})");
                crossings.push(ThresholdCrossing {
                    threshold_m,
                    sample_index: index,
                    elapsed_s,
                });
                false
            } else {
                true
            }
        });

        if self.samples.len() >= self.config.sample_count {
            self.state = CycleState::Done;
        }
        Ok(())
    }

    fn finish(mut self) -> CycleResult {
        self.crossings.sort_by(|a, b| {
            a.sample_index
                .cmp(&b.sample_index)
                .then(a.threshold_m.total_cmp(&b.threshold_m))
        });
        debug!(
            "{} cycle complete: {} samples, final uncertainty {:.6} m",
            self.axis,
            self.samples.len(),
            self.accumulated
        );
        CycleResult {
            axis: self.axis,
            config: self.config,
            samples: self.samples,
            crossings: self.crossings,
        }
    }
}

/// A recalibration cycle replicated over the full patrol.
#[derive(Clone, Debug, PartialEq)]
pub struct PatrolResult {
    pub axis: Axis,
    /// Number of samples in one cycle
    pub cycle_length: usize,
    pub repeat_count: usize,
    /// Span of the time axis, seconds
    pub duration_s: f64,
    /// `(elapsed_s, sigma_m)` pairs for the whole patrol
    pub samples: Vec<UncertaintySample>,
}
impl PatrolResult {
    /// Repeat the cycle's values `repeat_count` times over an evenly spaced patrol time axis.
    ///
    /// Only the values are copied from the cycle. The time axis is a separate
    /// [`linspace`] from zero to the patrol duration with one point per value, so the elapsed
    /// time keeps increasing across repetitions.
    pub fn replicate(cycle: &CycleResult) -> Self {
        let repeat_count = cycle.config.repeat_count;
        let cycle_length = cycle.samples.len();
        let duration_s = cycle.config.patrol_duration_s();
        let times = linspace(0.0, duration_s, cycle_length * repeat_count);
        let values = cycle
            .samples
            .iter()
            .map(|s| s.sigma_m)
            .cycle()
            .take(cycle_length * repeat_count);
        let samples = times
            .into_iter()
            .zip(values)
            .map(|(elapsed_s, sigma_m)| UncertaintySample { elapsed_s, sigma_m })
            .collect();
        PatrolResult {
            axis: cycle.axis,
            cycle_length,
            repeat_count,
            duration_s,
            samples,
        }
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// Accumulated uncertainty at patrol sample `index`.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.samples.get(index).map(|s| s.sigma_m)
    }
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.sigma_m)
    }
    /// Write the patrol samples to a CSV file with an `elapsed_s,sigma_m` header.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_samples(&self.samples, path)
    }
}

/// `count` evenly spaced values from `start` to `stop`, both ends included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
            values[count - 1] = stop;
            values
        }
    }
}

fn write_samples<P: AsRef<Path>>(samples: &[UncertaintySample], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicalModel;
    use assert_approx_eq::assert_approx_eq;

    fn short_config(sample_count: usize) -> AxisRunConfig {
        AxisRunConfig {
            sample_count,
            repeat_count: 3,
            ..AxisRunConfig::default()
        }
    }

    #[test]
    fn test_z_cycle_closed_form() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::Z, &short_config(20))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(cycle.len(), 20);
        for (i, sample) in cycle.samples.iter().enumerate() {
            // 0.005 t^2 at the end of window i
            let end = (i + 1) as f64 * 10.0;
            assert_eq!(sample.elapsed_s, i as f64 * 10.0);
            assert_approx_eq!(sample.sigma_m, 0.005 * end * end, 1e-9);
        }
        assert_eq!(cycle.first_crossing(1.0).unwrap().sample_index, 1);
        assert_eq!(cycle.first_crossing(10.0).unwrap().sample_index, 4);
        let hundred = cycle.first_crossing(100.0).unwrap();
        assert_eq!(hundred.sample_index, 14);
        assert_eq!(hundred.elapsed_s, 140.0);
    }
    #[test]
    fn test_x_cycle_crossings() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::X, &short_config(15_000))
            .unwrap()
            .run_parallel()
            .unwrap();
        // sigma_x = 5e-9 t^2 at the end of each window
        assert_eq!(cycle.first_crossing(1.0).unwrap().sample_index, 1414);
        assert_eq!(cycle.first_crossing(10.0).unwrap().sample_index, 4472);
        assert_eq!(cycle.first_crossing(100.0).unwrap().sample_index, 14142);
        assert_eq!(cycle.crossings.len(), 3);
    }
    #[test]
    fn test_state_machine() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let mut simulator = CycleSimulator::new(chain, Axis::Z, &short_config(3)).unwrap();
        assert_eq!(simulator.state(), CycleState::Accumulating);
        assert_eq!(simulator.step().unwrap(), CycleState::Accumulating);
        assert_eq!(simulator.step().unwrap(), CycleState::Accumulating);
        assert_eq!(simulator.step().unwrap(), CycleState::Done);
        assert_eq!(simulator.step().unwrap(), CycleState::Done);
        assert_eq!(simulator.samples().len(), 3);
        assert_approx_eq!(simulator.accumulated(), 4.5, 1e-10);
        assert_eq!(simulator.crossings().len(), 1);
    }
    #[test]
    fn test_parallel_matches_sequential() {
        let model = PhysicalModel {
            theta_in_rad: 0.4,
            theta_long_rad: 0.1,
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        for axis in Axis::ALL {
            let config = short_config(200);
            let sequential = CycleSimulator::new(chain, axis, &config).unwrap().run().unwrap();
            let parallel = CycleSimulator::new(chain, axis, &config)
                .unwrap()
                .run_parallel()
                .unwrap();
            assert_eq!(sequential, parallel);
        }
    }
    #[test]
    fn test_parallel_resumes_after_steps() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let config = short_config(10);
        let mut simulator = CycleSimulator::new(chain, Axis::Z, &config).unwrap();
        simulator.step().unwrap();
        simulator.step().unwrap();
        let resumed = simulator.run_parallel().unwrap();
        let fresh = CycleSimulator::new(chain, Axis::Z, &config).unwrap().run().unwrap();
        assert_eq!(resumed, fresh);
    }
    #[test]
    fn test_invariant_violation() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let mut simulator = CycleSimulator::new(chain, Axis::X, &short_config(5)).unwrap();
        simulator.accumulate(1.0).unwrap();
        let err = simulator.accumulate(-0.5).unwrap_err();
        assert!(matches!(
            err,
            DriftError::InvariantViolation { axis: Axis::X, index: 1, .. }
        ));
        assert!(simulator.accumulate(f64::NAN).is_err());
    }
    #[test]
    fn test_position_seed_is_starting_value() {
        let model = PhysicalModel {
            position_seed_m: [0.0, 0.0, 2.0],
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::Z, &short_config(2))
            .unwrap()
            .run()
            .unwrap();
        assert_approx_eq!(cycle.samples[0].sigma_m, 2.5, 1e-10);
        assert_eq!(cycle.first_crossing(1.0).unwrap().sample_index, 0);
        assert!(cycle.first_crossing(10.0).is_none());
    }
    #[test]
    fn test_y_axis_degenerate() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::Y, &AxisRunConfig::baseline(Axis::Y))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(cycle.len(), Y_SAMPLE_COUNT);
        assert!(cycle.samples.iter().all(|s| s.sigma_m == 0.0));
        assert!(cycle.crossings.is_empty());
        assert_eq!(cycle.samples[249].elapsed_s, 249.0);
    }
    #[test]
    fn test_config_validation() {
        let bad = [
            AxisRunConfig {
                sample_width_s: -10.0,
                ..AxisRunConfig::default()
            },
            AxisRunConfig {
                sample_width_s: 0.0,
                ..AxisRunConfig::default()
            },
            AxisRunConfig {
                sample_count: 0,
                ..AxisRunConfig::default()
            },
            AxisRunConfig {
                repeat_count: 0,
                ..AxisRunConfig::default()
            },
            AxisRunConfig {
                thresholds_m: vec![1.0, f64::NAN],
                ..AxisRunConfig::default()
            },
            AxisRunConfig {
                patrol_duration_s: Some(-1.0),
                ..AxisRunConfig::default()
            },
        ];
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        for config in bad {
            assert!(matches!(
                CycleSimulator::new(chain, Axis::X, &config),
                Err(DriftError::Configuration(_))
            ));
        }
        assert!(AxisRunConfig::default().validate().is_ok());
    }
    #[test]
    fn test_baseline_durations() {
        let config = AxisRunConfig::baseline(Axis::X);
        assert_eq!(config.cycle_duration_s(), 2.5e6);
        assert_approx_eq!(config.cycle_duration_s() / 86_400.0, 28.935, 1e-3);
        assert_approx_eq!(config.patrol_duration_s() / 86_400.0, 140.4676, 1e-9);
        let y = AxisRunConfig::baseline(Axis::Y);
        assert_eq!(y.sample_width_s, 1.0);
        assert_eq!(y.sample_count, 250);
        assert_eq!(y.patrol_duration_s(), config.patrol_duration_s());
        assert_eq!(AxisRunConfig::baseline(Axis::Z).patrol_duration_s(), config.patrol_duration_s());
    }
    #[test]
    fn test_patrol_duration_falls_back_to_sampling() {
        let config = AxisRunConfig::default();
        assert!(config.patrol_duration_s.is_none());
        assert_eq!(config.patrol_duration_s(), 1.25e7);
    }
    #[test]
    fn test_replication_fidelity() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::Z, &short_config(7))
            .unwrap()
            .run()
            .unwrap();
        let patrol = PatrolResult::replicate(&cycle);
        assert_eq!(patrol.len(), 21);
        for k in 0..3 {
            for i in 0..7 {
                assert_eq!(patrol.value_at(k * 7 + i), Some(cycle.samples[i].sigma_m));
            }
        }
        assert_eq!(patrol.value_at(21), None);
        // the time axis does not restart with each repetition
        assert_eq!(patrol.samples[0].elapsed_s, 0.0);
        assert_eq!(patrol.samples[20].elapsed_s, 210.0);
        assert!(patrol.samples.windows(2).all(|w| w[1].elapsed_s > w[0].elapsed_s));
        assert_approx_eq!(patrol.samples[7].elapsed_s, 7.0 * 210.0 / 20.0, 1e-12);
    }
    #[test]
    fn test_patrol_duration_override() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let config = AxisRunConfig {
            patrol_duration_s: Some(1000.0),
            ..short_config(5)
        };
        let cycle = CycleSimulator::new(chain, Axis::Z, &config).unwrap().run().unwrap();
        let patrol = PatrolResult::replicate(&cycle);
        assert_eq!(patrol.duration_s, 1000.0);
        assert_eq!(patrol.samples.last().unwrap().elapsed_s, 1000.0);
    }
    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
    #[test]
    fn test_cycle_csv() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let cycle = CycleSimulator::new(chain, Axis::Z, &short_config(4))
            .unwrap()
            .run()
            .unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        cycle.to_csv(file.path()).unwrap();
        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "elapsed_s");
        assert_eq!(&headers[1], "sigma_m");
        let rows: Vec<UncertaintySample> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, cycle.samples);
    }
}
