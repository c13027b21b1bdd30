//! End-to-end tests of the baseline patrol scenario
//!
//! The baseline is a vehicle cruising level at 10 m/s with zero commanded acceleration, an
//! accelerometer bias of 0.01 m/s^2 with a 1.0005 nonlinearity multiplier and a gyroscope drift
//! of 1e-9 rad/s. X and Z are sampled in 10 s windows over a 250 000 window recalibration cycle
//! (about 28.94 days) and the cycle is repeated five times. Every axis reports over the same
//! 140.4676 day patrol.
//!
//! For these constants the chain reduces to closed forms: the X velocity uncertainty is
//! `v * alpha_1 * t`, so X position grows as `5e-9 t^2`, and the Z velocity uncertainty is
//! `sigma_a0 * t`, so Z position grows as `0.005 t^2`. The crossing indices asserted below
//! follow from those expressions evaluated at the end of each window.

use drift::Axis;
use drift::cycle::{DEFAULT_PATROL_DURATION_S, DEFAULT_SAMPLE_COUNT};
use drift::sim::{SimulationConfig, run_axis, run_simulation};

#[test]
fn baseline_x_axis_full_patrol() {
    let config = SimulationConfig {
        parallel: true,
        ..SimulationConfig::default()
    };
    let report = run_axis(&config, Axis::X).unwrap();

    assert_eq!(report.cycle.len(), DEFAULT_SAMPLE_COUNT);
    assert_eq!(report.patrol.len(), 250_000 * 5);

    let one = report.cycle.first_crossing(1.0).unwrap();
    assert!(one.sample_index > 0 && one.sample_index < 250_000);
    assert_eq!(one.sample_index, 1414);
    assert_eq!(one.elapsed_s, 14_140.0);
    assert_eq!(report.cycle.first_crossing(10.0).unwrap().sample_index, 4472);
    assert_eq!(report.cycle.first_crossing(100.0).unwrap().sample_index, 14_142);

    // 5e-9 * (2.5e6)^2 at the end of the cycle
    let final_sigma = report.cycle.final_sigma().unwrap();
    assert!((final_sigma - 31_250.0).abs() / 31_250.0 < 1e-6);

    for k in 0..5 {
        let offset = k * DEFAULT_SAMPLE_COUNT;
        for i in [0, 1414, 100_000, DEFAULT_SAMPLE_COUNT - 1] {
            assert_eq!(
                report.patrol.value_at(offset + i),
                Some(report.cycle.samples[i].sigma_m)
            );
        }
    }
    assert!(report.cycle.samples.windows(2).all(|w| w[1].sigma_m >= w[0].sigma_m));
    assert_eq!(
        report.patrol.samples.last().unwrap().elapsed_s,
        DEFAULT_PATROL_DURATION_S
    );
}

#[test]
fn baseline_all_axes() {
    let mut config = SimulationConfig {
        parallel: true,
        ..SimulationConfig::default()
    };
    // a shorter cycle keeps this test quick; the crossings all happen early
    config.x.sample_count = 20_000;
    config.z.sample_count = 20_000;
    let report = run_simulation(&config).unwrap();

    let z = report.get(Axis::Z).unwrap();
    let z_indices: Vec<usize> = z.cycle.crossings.iter().map(|c| c.sample_index).collect();
    assert_eq!(z_indices, vec![1, 4, 14]);

    let x = report.get(Axis::X).unwrap();
    let x_indices: Vec<usize> = x.cycle.crossings.iter().map(|c| c.sample_index).collect();
    assert_eq!(x_indices, vec![1414, 4472, 14_142]);

    let y = report.get(Axis::Y).unwrap();
    assert_eq!(y.patrol.len(), 250 * 5);
    assert!(y.patrol.values().all(|v| v == 0.0));
    assert!(y.crossing_map().iter().all(|(_, crossing)| crossing.is_none()));

    // the time axis spans the patrol, not the sampling grid
    let last_elapsed = |axis: Axis| report.get(axis).unwrap().patrol.samples.last().unwrap().elapsed_s;
    assert_eq!(last_elapsed(Axis::Y), last_elapsed(Axis::X));
    assert_eq!(last_elapsed(Axis::Z), last_elapsed(Axis::X));
    assert_eq!(last_elapsed(Axis::Y), DEFAULT_PATROL_DURATION_S);

    // identical inputs give identical outputs
    let again = run_simulation(&config).unwrap();
    assert_eq!(report, again);
}
