//! Uncertainty growth toolbox for dead-reckoning inertial navigation
//!
//! This crate estimates how positional uncertainty accumulates for an inertial navigation system
//! (INS) that cannot re-fix its position externally for long stretches, such as a submerged
//! vehicle on patrol. Given a fixed set of sensor error parameters (accelerometer bias and
//! nonlinearity, gyroscope drift) and an assumed motion profile, it propagates first-order
//! standard-deviation estimates from orientation, to velocity, to position along three cartesian
//! axes, and reports when each axis's positional error first crosses a set of thresholds.
//!
//! This is an _estimate_ of uncertainty growth, not a navigation filter. There is no measured
//! sensor input, no state estimation and no correction: the orientation and velocity of the
//! vehicle are frozen at their initial values for the whole run and only read by the projection
//! step. Recalibration is modelled by replicating a single computed error-growth cycle.
//!
//! # Coordinate and angle conventions
//!
//! A side-on cartesian frame of the vehicle is used:
//! - $x$ lies in the plane of the page (right/left),
//! - $y$ points out of the page,
//! - $z$ is vertical.
//!
//! All orientation angles zero means the vehicle lies along the $z$ axis. The in-plane rotation
//! $\theta_{in}$ is pitch, the out-of-plane rotation $\theta_{out}$ is yaw and the longitudinal
//! rotation $\theta_{long}$ is roll. Units are fixed: seconds, meters and radians. Field names
//! carry their unit as a suffix and nothing in the crate converts units implicitly.
//!
//! # Uncertainty chain
//!
//! With commanded longitudinal acceleration $a(t)$, the instantaneous error rates are
//!
//! $$
//! \dot\sigma_a(t) = \sigma_{a0} + \alpha_a a(t), \qquad \dot\sigma_\theta(t) = \alpha_1 + \alpha_2 a(t)
//! $$
//!
//! which integrate to the orientation and velocity-magnitude uncertainties
//! $\sigma_\theta(t) = \int_0^t \dot\sigma_\theta$ and $\sigma_v(t) = \int_0^t \dot\sigma_a$.
//! These are projected onto the cartesian axes through the frozen initial orientation
//!
//! $$
//! \sigma_{v_x} = \sqrt{\sigma_v^2 \sin^2\theta_{in} + v^2 \sigma_{\theta_{in}}^2 \cos^2\theta_{in}}, \quad
//! \sigma_{v_y} = \sqrt{v^2 \sigma_{\theta_{in}}^2 \sin^2\theta_{in}}, \quad
//! \sigma_{v_z} = \sqrt{\sigma_v^2 \cos^2\theta_{in} + v^2 \sigma_{\theta_{in}}^2 \sin^2\theta_{in}}
//! $$
//!
//! and integrated once more to obtain positional uncertainty. See [`chain`] for the composition
//! and [`cycle`] for the recalibration cycle and patrol replication built on top of it.
//!
//! Modules, leaves first:
//! - [`rates`]: instantaneous error rates
//! - [`quadrature`]: adaptive Gauss–Kronrod integration
//! - [`chain`]: orientation → velocity → position uncertainty
//! - [`cycle`]: recalibration cycle, threshold crossings, patrol replication
//! - [`sim`]: run configuration, orchestration across axes and CSV export

pub mod chain;
pub mod cycle;
pub mod error;
pub mod quadrature;
pub mod rates;
pub mod sim;

pub use error::{DriftError, Result};

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// Baseline sensor constants
/// Constant rate of gyroscopic drift, rad/s ($\alpha_1$)
pub const GYRO_DRIFT_RATE: f64 = 1e-9;
/// Acceleration dependent gyroscopic drift, rad/m ($\alpha_2$)
pub const GYRO_ACCEL_DRIFT_FACTOR: f64 = 5e-7;
/// Constant accelerometer bias, m/s^2 ($\sigma_{a0}$)
pub const ACCEL_BIAS: f64 = 0.01;
/// Accelerometer nonlinearity multiplier, unitless ($\alpha_a$)
pub const ACCEL_NONLINEARITY: f64 = 1.0 + 5e-4;
/// Baseline cruising speed along the longitudinal axis, m/s
pub const CRUISE_VELOCITY: f64 = 10.0;

/// Cartesian axis selector for velocity and position uncertainty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}
impl Axis {
    /// All three axes in x, y, z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index into `[x, y, z]` arrays.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}
impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_uppercase())
    }
}

/// Orientation axis selector.
///
/// In-plane rotation is pitch, out-of-plane rotation is yaw and longitudinal rotation is roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationAxis {
    Pitch,
    Yaw,
    Roll,
}
impl OrientationAxis {
    pub const ALL: [OrientationAxis; 3] =
        [OrientationAxis::Pitch, OrientationAxis::Yaw, OrientationAxis::Roll];

    /// Index into `[in, out, long]` arrays.
    pub fn index(self) -> usize {
        match self {
            OrientationAxis::Pitch => 0,
            OrientationAxis::Yaw => 1,
            OrientationAxis::Roll => 2,
        }
    }
}
impl Display for OrientationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrientationAxis::Pitch => "pitch",
            OrientationAxis::Yaw => "yaw",
            OrientationAxis::Roll => "roll",
        };
        write!(f, "{name}")
    }
}

/// Commanded longitudinal acceleration as a function of time.
///
/// Every variant is smooth, so the rate functions built on top of it remain polynomials in `t`
/// and integrate exactly with the Kronrod rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccelerationProfile {
    /// Constant heading and speed (baseline).
    #[default]
    Zero,
    /// Constant acceleration in m/s^2.
    Constant { value_mps2: f64 },
    /// `sum(c_k * t^k)` in m/s^2, coefficients in ascending powers of `t`.
    Polynomial { coefficients: Vec<f64> },
}
impl AccelerationProfile {
    /// Acceleration at elapsed time `t` (seconds), in m/s^2.
    pub fn at(&self, t: f64) -> f64 {
        match self {
            AccelerationProfile::Zero => 0.0,
            AccelerationProfile::Constant { value_mps2 } => *value_mps2,
            // Horner evaluation
            AccelerationProfile::Polynomial { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |acc, &c| acc * t + c),
        }
    }
    fn is_finite(&self) -> bool {
        match self {
            AccelerationProfile::Zero => true,
            AccelerationProfile::Constant { value_mps2 } => value_mps2.is_finite(),
            AccelerationProfile::Polynomial { coefficients } => {
                coefficients.iter().all(|c| c.is_finite())
            }
        }
    }
}

/// Sensor error constants and the frozen initial kinematic state of the vehicle.
///
/// The model is read-only for the duration of a run. Orientation angles and velocity are never
/// updated from the integrated uncertainties; the result is a first-order estimate rather than a
/// fed-back state estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalModel {
    /// Initial in-plane (pitch) orientation, radians
    pub theta_in_rad: f64,
    /// Initial out-of-plane (yaw) orientation, radians
    pub theta_out_rad: f64,
    /// Initial longitudinal (roll) orientation, radians
    pub theta_long_rad: f64,
    /// Initial velocity magnitude along the longitudinal axis, m/s
    pub velocity_mps: f64,
    /// Initial position `[x, y, z]`, meters; origin of
    /// [`UncertaintyChain::nominal_position`](chain::UncertaintyChain::nominal_position)
    pub initial_position_m: [f64; 3],
    /// Initial position uncertainty `[x, y, z]`, meters
    pub position_seed_m: [f64; 3],
    /// Initial velocity uncertainty `[x, y, z]`, m/s
    pub velocity_seed_mps: [f64; 3],
    /// Initial orientation uncertainty `[in, out, long]`, radians
    pub orientation_seed_rad: [f64; 3],
    /// Constant gyroscopic drift rate, rad/s
    pub gyro_drift_rate_rad_s: f64,
    /// Acceleration dependent gyroscopic drift, rad per m/s^2 per second
    pub gyro_accel_drift_factor: f64,
    /// Constant accelerometer bias, m/s^2
    pub accel_bias_mps2: f64,
    /// Accelerometer nonlinearity multiplier applied to the true acceleration
    pub accel_nonlinearity: f64,
    /// Commanded longitudinal acceleration
    pub acceleration: AccelerationProfile,
}
impl Default for PhysicalModel {
    fn default() -> Self {
        PhysicalModel {
            theta_in_rad: 0.0,
            theta_out_rad: 0.0,
            theta_long_rad: 0.0,
            velocity_mps: CRUISE_VELOCITY,
            initial_position_m: [0.0; 3],
            position_seed_m: [0.0; 3],
            velocity_seed_mps: [0.0; 3],
            orientation_seed_rad: [0.0; 3],
            gyro_drift_rate_rad_s: GYRO_DRIFT_RATE,
            gyro_accel_drift_factor: GYRO_ACCEL_DRIFT_FACTOR,
            accel_bias_mps2: ACCEL_BIAS,
            accel_nonlinearity: ACCEL_NONLINEARITY,
            acceleration: AccelerationProfile::Zero,
        }
    }
}
impl Display for PhysicalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhysicalModel {{ theta: [{:.4}, {:.4}, {:.4}] rad, v: {:.3} m/s, gyro drift: {:e} rad/s, accel bias: {:e} m/s^2 }}",
            self.theta_in_rad,
            self.theta_out_rad,
            self.theta_long_rad,
            self.velocity_mps,
            self.gyro_drift_rate_rad_s,
            self.accel_bias_mps2
        )
    }
}
impl PhysicalModel {
    /// Reject non-finite constants and negative uncertainty seeds.
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("theta_in_rad", self.theta_in_rad),
            ("theta_out_rad", self.theta_out_rad),
            ("theta_long_rad", self.theta_long_rad),
            ("velocity_mps", self.velocity_mps),
            ("gyro_drift_rate_rad_s", self.gyro_drift_rate_rad_s),
            ("gyro_accel_drift_factor", self.gyro_accel_drift_factor),
            ("accel_bias_mps2", self.accel_bias_mps2),
            ("accel_nonlinearity", self.accel_nonlinearity),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(DriftError::config(format!("{name} must be finite, got {value}")));
            }
        }
        if self.initial_position_m.iter().any(|p| !p.is_finite()) {
            return Err(DriftError::config("initial_position_m must be finite"));
        }
        let seeds = [
            ("position_seed_m", self.position_seed_m),
            ("velocity_seed_mps", self.velocity_seed_mps),
            ("orientation_seed_rad", self.orientation_seed_rad),
        ];
        for (name, seed) in seeds {
            if seed.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(DriftError::config(format!(
                    "{name} must be finite and non-negative, got {seed:?}"
                )));
            }
        }
        if !self.acceleration.is_finite() {
            return Err(DriftError::config("acceleration profile must be finite"));
        }
        Ok(())
    }
}
