//! Gaussian truncation of ground-motion residuals.
//!
//! Exceedance probabilities are computed from the standard normal survival
//! function `Q(e) = 0.5 * erfc(e / sqrt(2))`, renormalised over the allowed
//! range of epsilon when truncation is active.

use crate::error::{ModelError, ModelResult};
use qh_core::Real;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use std::fmt;

/// Standard normal survival function, `P(Z > x)`.
pub fn standard_normal_sf(x: Real) -> Real {
    0.5 * libm::erfc(x / SQRT_2)
}

/// Inverse of the standard normal CDF.
///
/// Rational approximation (P. J. Acklam) followed by one Halley step
/// against `erfc`, giving close to full double precision. Returns
/// `-inf` / `+inf` at 0 / 1 and NaN outside [0, 1].
pub fn inverse_normal_cdf(p: Real) -> Real {
    const A: [Real; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [Real; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [Real; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [Real; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: Real = 0.02425;

    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return Real::NAN;
    }
    if p == 0.0 {
        return Real::NEG_INFINITY;
    }
    if p == 1.0 {
        return Real::INFINITY;
    }

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    // Halley refinement
    let e = 0.5 * libm::erfc(-x / SQRT_2) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

/// Truncation applied to the standardised residual epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Truncation {
    /// Full Gaussian.
    #[default]
    None,
    /// Upper tail removed above `level` standard deviations.
    OneSided { level: Real },
    /// Both tails removed beyond ±`level` standard deviations.
    TwoSided { level: Real },
}

impl Truncation {
    pub fn validate(&self) -> ModelResult<()> {
        match self {
            Self::None => Ok(()),
            Self::OneSided { level } | Self::TwoSided { level } => {
                if level.is_finite() && *level > 0.0 {
                    Ok(())
                } else {
                    Err(ModelError::Invalid {
                        what: "truncation level",
                        reason: format!("must be positive (got {level})"),
                    })
                }
            }
        }
    }

    /// Probability that the residual exceeds `epsilon`.
    pub fn exceedance_probability(&self, epsilon: Real) -> Real {
        match *self {
            Self::None => standard_normal_sf(epsilon),
            Self::OneSided { level } => {
                if epsilon >= level {
                    return 0.0;
                }
                let q_level = standard_normal_sf(level);
                ((standard_normal_sf(epsilon) - q_level) / (1.0 - q_level)).clamp(0.0, 1.0)
            }
            Self::TwoSided { level } => {
                if epsilon >= level {
                    return 0.0;
                }
                if epsilon <= -level {
                    return 1.0;
                }
                let q_level = standard_normal_sf(level);
                ((standard_normal_sf(epsilon) - q_level) / (1.0 - 2.0 * q_level)).clamp(0.0, 1.0)
            }
        }
    }

    /// Epsilon whose exceedance probability is `p`.
    ///
    /// Errors where the answer is unbounded: `p` of 0 without truncation, and
    /// `p` of 1 unless the lower tail is truncated.
    pub fn epsilon_at(&self, p: Real) -> ModelResult<Real> {
        let not_invertible = || ModelError::NotInvertible {
            value: p,
            truncation: self.to_string(),
        };
        if !(0.0..=1.0).contains(&p) {
            return Err(not_invertible());
        }
        let eps = match *self {
            Self::None => -inverse_normal_cdf(p),
            Self::OneSided { level } => {
                let q_level = standard_normal_sf(level);
                let target = p * (1.0 - q_level) + q_level;
                -inverse_normal_cdf(target)
            }
            Self::TwoSided { level } => {
                if p == 0.0 {
                    return Ok(level);
                }
                if p == 1.0 {
                    return Ok(-level);
                }
                let q_level = standard_normal_sf(level);
                let target = p * (1.0 - 2.0 * q_level) + q_level;
                -inverse_normal_cdf(target)
            }
        };
        if eps.is_finite() {
            Ok(eps)
        } else {
            Err(not_invertible())
        }
    }

    /// Whether a drawn deviate lies inside the allowed range.
    pub fn admits(&self, deviate: Real) -> bool {
        match *self {
            Self::None => true,
            Self::OneSided { level } => deviate <= level,
            Self::TwoSided { level } => deviate.abs() <= level,
        }
    }
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no truncation"),
            Self::OneSided { level } => write!(f, "one-sided truncation at {level} sigma"),
            Self::TwoSided { level } => write!(f, "two-sided truncation at {level} sigma"),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn exceedance_is_non_increasing(a in -6.0_f64..6.0, b in -6.0_f64..6.0, level in 0.5_f64..4.0) {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            for t in [Truncation::None, Truncation::OneSided { level }, Truncation::TwoSided { level }] {
                let p_lo = t.exceedance_probability(lo);
                let p_hi = t.exceedance_probability(hi);
                prop_assert!(p_hi <= p_lo + 1e-15);
                prop_assert!((0.0..=1.0).contains(&p_lo));
            }
        }
    }
}
