//! Report generation for simulation results.
//!
//! Turns the engine's structured output into the artefacts a reader looks at: milestone
//! narration in the log and the exceedance distribution of each patrol, i.e. the fraction of
//! patrol time spent at or above a given error level.

use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

use drift::cycle::ThresholdCrossing;
use drift::sim::AxisReport;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default number of bins for the exceedance distribution.
pub const DEFAULT_BINS: usize = 50;

/// Describe a threshold crossing in seconds, hours and days.
pub fn describe_crossing(axis: drift::Axis, crossing: &ThresholdCrossing) -> String {
    format!(
        "{} seconds, {:.3} hours, {:.3} days underwater before {} error hits {} m",
        crossing.elapsed_s,
        crossing.elapsed_s / SECONDS_PER_HOUR,
        crossing.elapsed_s / SECONDS_PER_DAY,
        axis,
        crossing.threshold_m
    )
}

/// Log every configured threshold for an axis, crossed or not.
pub fn log_milestones(report: &AxisReport) {
    let axis = report.axis();
    for (threshold, crossing) in report.crossing_map() {
        match crossing {
            Some(crossing) => info!("{}", describe_crossing(axis, crossing)),
            None => info!(
                "{axis} error stays below {threshold} m for the whole {:.3} day cycle",
                report.cycle.config.cycle_duration_s() / SECONDS_PER_DAY
            ),
        }
    }
}

/// One bin of a reverse cumulative histogram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExceedanceBin {
    pub lower_m: f64,
    pub upper_m: f64,
    /// Fraction of samples whose value falls in this bin or any higher one
    pub fraction_at_or_above: f64,
}

/// Reverse cumulative histogram of `values` over `bins` equal-width bins.
///
/// Bins span `[min, max]` of the data, with the last bin closed on the right. When every value
/// is equal the range is widened to `[v - 0.5, v + 0.5]`.
pub fn exceedance_distribution(values: &[f64], bins: usize) -> Vec<ExceedanceBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    let total = values.len() as f64;
    let mut above = 0usize;
    let mut distribution = vec![
        ExceedanceBin {
            lower_m: 0.0,
            upper_m: 0.0,
            fraction_at_or_above: 0.0,
        };
        bins
    ];
    for index in (0..bins).rev() {
        above += counts[index];
        distribution[index] = ExceedanceBin {
            lower_m: min + index as f64 * width,
            upper_m: if index == bins - 1 {
                max
            } else {
                min + (index + 1) as f64 * width
            },
            fraction_at_or_above: above as f64 / total,
        };
    }
    distribution
}

/// Write an exceedance distribution to CSV.
pub fn write_exceedance<P: AsRef<Path>>(
    distribution: &[ExceedanceBin],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for bin in distribution {
        writer.serialize(bin)?;
    }
    writer.flush()?;
    Ok(())
}
