//! Adaptive numerical quadrature.
//!
//! Public API:
//!     pub fn integrate(f, lower, upper) -> Result<f64, IntegrationError>
//!     Quadrature::integrate / Quadrature::try_integrate
//!
//! Strategy (globally adaptive Gauss–Kronrod, QUADPACK `qag` style):
//! 1) Apply the 15-point Kronrod rule on the whole interval, using the embedded 7-point Gauss
//!    rule for the error estimate.
//! 2) While the summed error estimate exceeds `max(abs_tolerance, rel_tolerance * |I|)`,
//!    bisect the segment with the largest error estimate.
//! 3) Give up with [`IntegrationError::NotConverged`] once `max_subdivisions` segments exist.
//!
//! The 15-point Kronrod rule is exact for polynomials up to degree 22, which covers every rate
//! function this crate integrates. Adaptivity only matters for user supplied integrands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default absolute tolerance, the customary `sqrt(f64::EPSILON)`-ish quadrature default.
pub const DEFAULT_ABS_TOLERANCE: f64 = 1.49e-8;
/// Default relative tolerance.
pub const DEFAULT_REL_TOLERANCE: f64 = 1.49e-8;
/// Default upper bound on the number of subintervals.
pub const DEFAULT_MAX_SUBDIVISIONS: usize = 50;

// Kronrod abscissae on [-1, 1]; odd indices are shared with the 7-point Gauss rule.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];
// Gauss weights for XGK[1], XGK[3], XGK[5] and the centre XGK[7].
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Quadrature failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error(
        "quadrature over [{lower}, {upper}] did not converge after {subdivisions} subdivisions \
         (estimate {estimate}, error {error})"
    )]
    NotConverged {
        lower: f64,
        upper: f64,
        estimate: f64,
        error: f64,
        subdivisions: usize,
    },
    #[error("non-finite value encountered at t = {at}")]
    NonFinite { at: f64 },
}

/// Tolerances and limits for the adaptive integrator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quadrature {
    #[serde(default = "default_abs_tolerance")]
    pub abs_tolerance: f64,
    #[serde(default = "default_rel_tolerance")]
    pub rel_tolerance: f64,
    #[serde(default = "default_max_subdivisions")]
    pub max_subdivisions: usize,
}

fn default_abs_tolerance() -> f64 {
    DEFAULT_ABS_TOLERANCE
}
fn default_rel_tolerance() -> f64 {
    DEFAULT_REL_TOLERANCE
}
fn default_max_subdivisions() -> usize {
    DEFAULT_MAX_SUBDIVISIONS
}

impl Default for Quadrature {
    fn default() -> Self {
        Quadrature {
            abs_tolerance: DEFAULT_ABS_TOLERANCE,
            rel_tolerance: DEFAULT_REL_TOLERANCE,
            max_subdivisions: DEFAULT_MAX_SUBDIVISIONS,
        }
    }
}

/// One bisected piece of the integration interval.
#[derive(Clone, Copy, Debug)]
struct Segment {
    lower: f64,
    upper: f64,
    estimate: f64,
    error: f64,
}

impl Quadrature {
    /// Integrate an infallible function over `[lower, upper]`.
    ///
    /// # Example
    /// ```rust
    /// use drift::quadrature::Quadrature;
    /// let area = Quadrature::default().integrate(|t| 3.0 * t * t, 0.0, 2.0).unwrap();
    /// assert!((area - 8.0).abs() < 1e-12);
    /// ```
    pub fn integrate<F>(&self, f: F, lower: f64, upper: f64) -> Result<f64, IntegrationError>
    where
        F: Fn(f64) -> f64,
    {
        self.try_integrate(|t| Ok::<f64, IntegrationError>(f(t)), lower, upper)
    }

    /// Integrate a fallible function over `[lower, upper]`.
    ///
    /// The integrand may itself run a quadrature; its error type only needs to absorb
    /// [`IntegrationError`], which lets nested integrals surface the innermost failure unchanged.
    ///
    /// # Arguments
    /// * `f` - the integrand
    /// * `lower`, `upper` - integration bounds; `upper < lower` integrates the reversed interval
    ///   and negates the result
    ///
    /// # Returns
    /// The integral estimate, or the first error raised by the integrand or the integrator.
    pub fn try_integrate<F, E>(&self, mut f: F, lower: f64, upper: f64) -> Result<f64, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
        E: From<IntegrationError>,
    {
        if !lower.is_finite() {
            return Err(IntegrationError::NonFinite { at: lower }.into());
        }
        if !upper.is_finite() {
            return Err(IntegrationError::NonFinite { at: upper }.into());
        }
        if lower == upper {
            return Ok(0.0);
        }
        if upper < lower {
            return self.try_integrate(f, upper, lower).map(|value: f64| -value);
        }

        let mut segments = vec![kronrod_segment(&mut f, lower, upper)?];
        loop {
            let estimate: f64 = segments.iter().map(|s| s.estimate).sum();
            let error: f64 = segments.iter().map(|s| s.error).sum();
            let tolerance = self.abs_tolerance.max(self.rel_tolerance * estimate.abs());
            if error <= tolerance {
                return Ok(estimate);
            }
            let not_converged = IntegrationError::NotConverged {
                lower,
                upper,
                estimate,
                error,
                subdivisions: segments.len(),
            };
            if segments.len() >= self.max_subdivisions {
                return Err(not_converged.into());
            }

            let mut worst = 0;
            for (index, segment) in segments.iter().enumerate().skip(1) {
                if segment.error > segments[worst].error {
                    worst = index;
                }
            }
            let segment = segments.swap_remove(worst);
            let midpoint = 0.5 * (segment.lower + segment.upper);
            // Interval can no longer be split in double precision.
            if midpoint <= segment.lower || midpoint >= segment.upper {
                return Err(not_converged.into());
            }
            segments.push(kronrod_segment(&mut f, segment.lower, midpoint)?);
            segments.push(kronrod_segment(&mut f, midpoint, segment.upper)?);
        }
    }
}

/// Integrate `f` over `[lower, upper]` with the default tolerances.
pub fn integrate<F>(f: F, lower: f64, upper: f64) -> Result<f64, IntegrationError>
where
    F: Fn(f64) -> f64,
{
    Quadrature::default().integrate(f, lower, upper)
}

/// Apply the 15-point Kronrod rule on a single segment and estimate its error.
fn kronrod_segment<F, E>(f: &mut F, lower: f64, upper: f64) -> Result<Segment, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<IntegrationError>,
{
    let centre = 0.5 * (lower + upper);
    let half_length = 0.5 * (upper - lower);

    let mut evaluate = |t: f64| -> Result<f64, E> {
        let value = f(t)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(IntegrationError::NonFinite { at: t }.into())
        }
    };

    let f_centre = evaluate(centre)?;
    let mut kronrod = WGK[7] * f_centre;
    let mut gauss = WG[3] * f_centre;
    let mut abs_sum = kronrod.abs();
    let mut lefts = [0.0; 7];
    let mut rights = [0.0; 7];
    for j in 0..7 {
        let offset = half_length * XGK[j];
        let left = evaluate(centre - offset)?;
        let right = evaluate(centre + offset)?;
        lefts[j] = left;
        rights[j] = right;
        kronrod += WGK[j] * (left + right);
        abs_sum += WGK[j] * (left.abs() + right.abs());
        if j % 2 == 1 {
            gauss += WG[j / 2] * (left + right);
        }
    }

    let mean = 0.5 * kronrod;
    let mut deviation = WGK[7] * (f_centre - mean).abs();
    for j in 0..7 {
        deviation += WGK[j] * ((lefts[j] - mean).abs() + (rights[j] - mean).abs());
    }

    let estimate = kronrod * half_length;
    let abs_sum = abs_sum * half_length.abs();
    let deviation = deviation * half_length.abs();
    let mut error = ((kronrod - gauss) * half_length).abs();
    if deviation != 0.0 && error != 0.0 {
        error = deviation * (200.0 * error / deviation).powf(1.5).min(1.0);
    }
    if abs_sum > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * abs_sum);
    }

    Ok(Segment {
        lower,
        upper,
        estimate,
        error,
    })
}
