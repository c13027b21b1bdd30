//! Orientation → velocity → position uncertainty propagation.
//!
//! Each stage is a pure function of elapsed time built by integrating the stage below it:
//!
//! 1. orientation uncertainty: $\sigma_\theta(t) = \sigma_{\theta,0} + \int_0^t \dot\sigma_\theta$
//! 2. velocity-magnitude uncertainty: $\sigma_v(t) = \int_0^t \dot\sigma_a$
//! 3. cartesian velocity uncertainty, combining (1) and (2) in quadrature through the frozen
//!    initial orientation
//! 4. positional uncertainty: $\sigma_p(t_0, t) = \int_{t_0}^{t} \sigma_{v_{axis}}$
//!
//! Stage 4 integrates stage 3, which integrates the rate functions internally, so every
//! positional sample is a triple-nested quadrature. That cost is why the [`cycle`](crate::cycle)
//! module computes one recalibration cycle and replicates it instead of integrating a whole
//! patrol.
//!
//! The projection always uses the _initial_ orientation angles from the model. The propagated
//! orientation uncertainty only scales the result; it is never fed back into the angles.

use nalgebra::Vector3;

use crate::quadrature::Quadrature;
use crate::rates::{acceleration_error_rate, orientation_error_rate};
use crate::{Axis, OrientationAxis, PhysicalModel, Result};

/// Composes the rate functions and the integrator into the uncertainty stages.
#[derive(Clone, Copy, Debug)]
pub struct UncertaintyChain<'a> {
    model: &'a PhysicalModel,
    quadrature: Quadrature,
}

impl<'a> UncertaintyChain<'a> {
    /// Chain over `model` using the default quadrature tolerances.
    pub fn new(model: &'a PhysicalModel) -> Self {
        Self::with_quadrature(model, Quadrature::default())
    }
    pub fn with_quadrature(model: &'a PhysicalModel, quadrature: Quadrature) -> Self {
        UncertaintyChain { model, quadrature }
    }
    pub fn model(&self) -> &PhysicalModel {
        self.model
    }
    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    /// Accumulated orientation uncertainty (radians) for `axis` after `t` seconds.
    pub fn orientation_uncertainty(&self, axis: OrientationAxis, t: f64) -> Result<f64> {
        let drift = self
            .quadrature
            .integrate(|s| orientation_error_rate(self.model, axis, s), 0.0, t)?;
        Ok(self.model.orientation_seed_rad[axis.index()] + drift)
    }

    /// Accumulated uncertainty (m/s) of the velocity magnitude after `t` seconds.
    pub fn velocity_magnitude_uncertainty(&self, t: f64) -> Result<f64> {
        Ok(self
            .quadrature
            .integrate(|s| acceleration_error_rate(self.model, s), 0.0, t)?)
    }

    /// Along-track velocity (m/s) after `t` seconds including its accumulated uncertainty.
    ///
    /// This is the commanded velocity change $\int_0^t a$ plus $\sigma_v(t)$. The frozen initial
    /// speed used by the projection is not part of it.
    pub fn velocity(&self, t: f64) -> Result<f64> {
        let commanded = self
            .quadrature
            .integrate(|s| self.model.acceleration.at(s), 0.0, t)?;
        Ok(commanded + self.velocity_magnitude_uncertainty(t)?)
    }

    /// Unit projection of the longitudinal axis onto `[x, y, z]` from the frozen orientation.
    pub fn projection(&self) -> Vector3<f64> {
        let (sin_in, cos_in) = self.model.theta_in_rad.sin_cos();
        let (sin_long, cos_long) = self.model.theta_long_rad.sin_cos();
        let cos_out = self.model.theta_out_rad.cos();
        Vector3::new(sin_in * cos_long, sin_in * sin_long, cos_in * cos_out)
    }

    /// Frozen initial velocity projected onto the cartesian axes, m/s.
    pub fn frozen_cartesian_velocity(&self) -> Vector3<f64> {
        self.model.velocity_mps * self.projection()
    }

    /// Nominal dead-reckoned position `[x, y, z]` (m) after `t` seconds.
    ///
    /// Starts at the model's initial position and moves with the frozen cartesian velocity, so
    /// this is the point the uncertainties in [`position_uncertainty`](Self::position_uncertainty)
    /// are centred on.
    pub fn nominal_position(&self, t: f64) -> Vector3<f64> {
        Vector3::from(self.model.initial_position_m) + self.frozen_cartesian_velocity() * t
    }

    /// [`velocity`](Self::velocity) projected onto the cartesian axes, m/s.
    pub fn cartesian_velocity(&self, t: f64) -> Result<Vector3<f64>> {
        Ok(self.velocity(t)? * self.projection())
    }

    /// Cartesian velocity uncertainty (m/s) along `axis` after `t` seconds.
    ///
    /// The Y component carries no velocity-magnitude term. That mirrors the baseline derivation,
    /// which assumes no sideways velocity, and is kept as is.
    pub fn axis_velocity_uncertainty(&self, axis: Axis, t: f64) -> Result<f64> {
        let v = self.model.velocity_mps;
        let (sin_in, cos_in) = self.model.theta_in_rad.sin_cos();
        let sigma_theta_in = self.orientation_uncertainty(OrientationAxis::Pitch, t)?;
        let heading_term = v.powi(2) * sigma_theta_in.powi(2);

        let sigma = match axis {
            Axis::X => {
                let sigma_v = self.velocity_magnitude_uncertainty(t)?;
                (sigma_v.powi(2) * sin_in.powi(2) + heading_term * cos_in.powi(2)).sqrt()
            }
            Axis::Y => (heading_term * sin_in.powi(2)).sqrt(),
            Axis::Z => {
                let sigma_v = self.velocity_magnitude_uncertainty(t)?;
                (sigma_v.powi(2) * cos_in.powi(2) + heading_term * sin_in.powi(2)).sqrt()
            }
        };
        Ok(self.model.velocity_seed_mps[axis.index()].hypot(sigma))
    }

    /// All three cartesian velocity uncertainties after `t` seconds.
    pub fn velocity_uncertainty(&self, t: f64) -> Result<Vector3<f64>> {
        Ok(Vector3::new(
            self.axis_velocity_uncertainty(Axis::X, t)?,
            self.axis_velocity_uncertainty(Axis::Y, t)?,
            self.axis_velocity_uncertainty(Axis::Z, t)?,
        ))
    }

    /// Positional uncertainty (m) accumulated along `axis` between `start` and `end` seconds.
    pub fn position_uncertainty(&self, axis: Axis, start: f64, end: f64) -> Result<f64> {
        self.quadrature
            .try_integrate(|t| self.axis_velocity_uncertainty(axis, t), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccelerationProfile;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_orientation_uncertainty_linear() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        for axis in OrientationAxis::ALL {
            assert_approx_eq!(chain.orientation_uncertainty(axis, 3600.0).unwrap(), 3.6e-6, 1e-18);
        }
        assert_eq!(chain.orientation_uncertainty(OrientationAxis::Yaw, 0.0).unwrap(), 0.0);
    }
    #[test]
    fn test_orientation_seed_offsets() {
        let model = PhysicalModel {
            orientation_seed_rad: [1e-3, 0.0, 0.0],
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        assert_approx_eq!(
            chain.orientation_uncertainty(OrientationAxis::Pitch, 100.0).unwrap(),
            1e-3 + 1e-7,
            1e-15
        );
        assert_approx_eq!(
            chain.orientation_uncertainty(OrientationAxis::Roll, 100.0).unwrap(),
            1e-7,
            1e-18
        );
    }
    #[test]
    fn test_nominal_position_starts_at_initial_position() {
        let model = PhysicalModel {
            initial_position_m: [100.0, -20.0, 5.0],
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        assert_eq!(chain.nominal_position(0.0), Vector3::new(100.0, -20.0, 5.0));
        // level cruise: all motion along z at 10 m/s
        let position = chain.nominal_position(60.0);
        assert_approx_eq!(position.x, 100.0, 1e-12);
        assert_approx_eq!(position.y, -20.0, 1e-12);
        assert_approx_eq!(position.z, 605.0, 1e-12);
    }
    #[test]
    fn test_velocity_magnitude_closed_form() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        for t in [1.0, 10.0, 12_345.0, 2.5e6] {
            let sigma_v = chain.velocity_magnitude_uncertainty(t).unwrap();
            assert!(((sigma_v - 0.01 * t) / (0.01 * t)).abs() < 1e-12);
        }
    }
    #[test]
    fn test_velocity_with_constant_acceleration() {
        let model = PhysicalModel {
            acceleration: AccelerationProfile::Constant { value_mps2: 0.1 },
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        let t = 50.0;
        let sigma_v = (0.01 + 1.0005 * 0.1) * t;
        assert_approx_eq!(chain.velocity_magnitude_uncertainty(t).unwrap(), sigma_v, 1e-12);
        assert_approx_eq!(chain.velocity(t).unwrap(), 0.1 * t + sigma_v, 1e-12);
        // gyro drift picks up the acceleration dependent term
        assert_approx_eq!(
            chain.orientation_uncertainty(OrientationAxis::Pitch, t).unwrap(),
            (1e-9 + 5e-7 * 0.1) * t,
            1e-18
        );
    }
    #[test]
    fn test_projection_baseline() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        assert_eq!(chain.frozen_cartesian_velocity(), Vector3::new(0.0, 0.0, 10.0));
        let velocity = chain.cartesian_velocity(100.0).unwrap();
        assert_eq!(velocity[0], 0.0);
        assert_eq!(velocity[1], 0.0);
        assert_approx_eq!(velocity[2], 1.0, 1e-12);
    }
    #[test]
    fn test_projection_pitched_and_rolled() {
        let model = PhysicalModel {
            theta_in_rad: 0.3,
            theta_out_rad: 0.2,
            theta_long_rad: 0.4,
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        let v = chain.frozen_cartesian_velocity();
        assert_approx_eq!(v[0], 10.0 * 0.3f64.sin() * 0.4f64.cos(), 1e-12);
        assert_approx_eq!(v[1], 10.0 * 0.3f64.sin() * 0.4f64.sin(), 1e-12);
        assert_approx_eq!(v[2], 10.0 * 0.3f64.cos() * 0.2f64.cos(), 1e-12);
    }
    #[test]
    fn test_level_velocity_uncertainty() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        let t = 1000.0;
        let sigma = chain.velocity_uncertainty(t).unwrap();
        // theta_in = 0: x sees only heading error, z only magnitude error
        assert_approx_eq!(sigma[0], 10.0 * 1e-9 * t, 1e-15);
        assert_eq!(sigma[1], 0.0);
        assert_approx_eq!(sigma[2], 0.01 * t, 1e-10);
    }
    #[test]
    fn test_vertical_velocity_uncertainty() {
        let model = PhysicalModel {
            theta_in_rad: FRAC_PI_2,
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        let t = 1000.0;
        let sigma = chain.velocity_uncertainty(t).unwrap();
        assert_approx_eq!(sigma[0], 0.01 * t, 1e-10);
        assert_approx_eq!(sigma[1], 10.0 * 1e-9 * t, 1e-15);
        assert_approx_eq!(sigma[2], 10.0 * 1e-9 * t, 1e-12);
    }
    #[test]
    fn test_velocity_seed_in_quadrature() {
        let model = PhysicalModel {
            velocity_seed_mps: [0.0, 3.0, 0.0],
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        assert_approx_eq!(chain.axis_velocity_uncertainty(Axis::Y, 500.0).unwrap(), 3.0, 1e-15);
        let sigma_z = chain.axis_velocity_uncertainty(Axis::Z, 400.0).unwrap();
        assert_approx_eq!(sigma_z, 4.0, 1e-10);
    }
    #[test]
    fn test_position_uncertainty_closed_form() {
        let model = PhysicalModel::default();
        let chain = UncertaintyChain::new(&model);
        // sigma_vz = 0.01 t  =>  sigma_z(0, T) = 0.005 T^2
        assert_approx_eq!(chain.position_uncertainty(Axis::Z, 0.0, 100.0).unwrap(), 50.0, 1e-9);
        // sigma_vx = 1e-8 t  =>  sigma_x(t0, t1) = 5e-9 (t1^2 - t0^2)
        let x = chain.position_uncertainty(Axis::X, 1000.0, 1010.0).unwrap();
        assert_approx_eq!(x, 5e-9 * (1010.0f64.powi(2) - 1000.0f64.powi(2)), 1e-15);
        assert_eq!(chain.position_uncertainty(Axis::Y, 0.0, 1e5).unwrap(), 0.0);
    }
    #[test]
    fn test_position_uncertainty_is_additive() {
        let model = PhysicalModel {
            theta_in_rad: 0.25,
            ..PhysicalModel::default()
        };
        let chain = UncertaintyChain::new(&model);
        for axis in Axis::ALL {
            let whole = chain.position_uncertainty(axis, 0.0, 200.0).unwrap();
            let parts = chain.position_uncertainty(axis, 0.0, 70.0).unwrap()
                + chain.position_uncertainty(axis, 70.0, 200.0).unwrap();
            assert!(((whole - parts) / whole).abs() < 1e-9);
        }
    }
}
