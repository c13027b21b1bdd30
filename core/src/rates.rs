//! Instantaneous error rates.
//!
//! These are the leaves of the uncertainty chain: pure functions of elapsed time that return how
//! fast a standard deviation is growing at that instant. They depend only on the
//! [`PhysicalModel`] constants and its commanded acceleration profile.

use crate::{OrientationAxis, PhysicalModel};

/// Accelerometer error rate in m/s^2 at elapsed time `t`.
///
/// $\dot\sigma_a(t) = \sigma_{a0} + \alpha_a a(t)$. With zero commanded acceleration only the
/// constant bias remains.
pub fn acceleration_error_rate(model: &PhysicalModel, t: f64) -> f64 {
    model.accel_bias_mps2 + model.accel_nonlinearity * model.acceleration.at(t)
}

/// Orientation error rate in rad/s for one axis at elapsed time `t`.
///
/// $\dot\sigma_\theta(t) = \alpha_1 + \alpha_2 a(t)$. The gyroscope model is the same for all
/// three axes, so `axis` only selects which named quantity is being asked for.
pub fn orientation_error_rate(model: &PhysicalModel, axis: OrientationAxis, t: f64) -> f64 {
    match axis {
        OrientationAxis::Pitch | OrientationAxis::Yaw | OrientationAxis::Roll => {
            model.gyro_drift_rate_rad_s + model.gyro_accel_drift_factor * model.acceleration.at(t)
        }
    }
}

/// In-plane (pitch) orientation error rate.
pub fn pitch_error_rate(model: &PhysicalModel, t: f64) -> f64 {
    orientation_error_rate(model, OrientationAxis::Pitch, t)
}

/// Out-of-plane (yaw) orientation error rate.
pub fn yaw_error_rate(model: &PhysicalModel, t: f64) -> f64 {
    orientation_error_rate(model, OrientationAxis::Yaw, t)
}

/// Longitudinal (roll) orientation error rate.
pub fn roll_error_rate(model: &PhysicalModel, t: f64) -> f64 {
    orientation_error_rate(model, OrientationAxis::Roll, t)
}
