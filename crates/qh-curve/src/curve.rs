//! Discretized (x, y) functions with strictly increasing x.

use crate::error::{CurveError, CurveResult};
use qh_core::Real;
use serde::Serialize;

/// Ordered sequence of (x, y) pairs.
///
/// Invariant: x is finite and strictly increasing. y is unconstrained here;
/// hazard engines guarantee y ∈ [0, 1] and non-increasing after a completed
/// calculation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscretizedCurve {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl DiscretizedCurve {
    /// Curve over `xs` with every y set to 0.
    pub fn new(xs: Vec<Real>) -> CurveResult<Self> {
        Self::with_fill(xs, 0.0)
    }

    /// Curve over `xs` with every y set to `value`.
    pub fn with_fill(xs: Vec<Real>, value: Real) -> CurveResult<Self> {
        validate_xs(&xs)?;
        let ys = vec![value; xs.len()];
        Ok(Self { xs, ys })
    }

    pub fn from_points(xs: Vec<Real>, ys: Vec<Real>) -> CurveResult<Self> {
        if xs.len() != ys.len() {
            return Err(CurveError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        validate_xs(&xs)?;
        Ok(Self { xs, ys })
    }

    /// Same x values, new y values.
    pub fn with_ys(&self, ys: Vec<Real>) -> CurveResult<Self> {
        if ys.len() != self.xs.len() {
            return Err(CurveError::LengthMismatch {
                xs: self.xs.len(),
                ys: ys.len(),
            });
        }
        Ok(Self {
            xs: self.xs.clone(),
            ys,
        })
    }

    /// Transform the x axis (e.g. `f64::ln` / `f64::exp`); the result is
    /// re-validated so the transform must be strictly increasing.
    pub fn map_x(&self, f: impl Fn(Real) -> Real) -> CurveResult<Self> {
        let xs: Vec<Real> = self.xs.iter().map(|&x| f(x)).collect();
        Self::from_points(xs, self.ys.clone())
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false: construction rejects empty curves.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[Real] {
        &self.xs
    }

    pub fn ys(&self) -> &[Real] {
        &self.ys
    }

    pub fn ys_mut(&mut self) -> &mut [Real] {
        &mut self.ys
    }

    pub fn x(&self, i: usize) -> Real {
        self.xs[i]
    }

    pub fn y(&self, i: usize) -> Real {
        self.ys[i]
    }

    pub fn set_y(&mut self, i: usize, value: Real) {
        self.ys[i] = value;
    }

    pub fn fill(&mut self, value: Real) {
        self.ys.iter_mut().for_each(|y| *y = value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Real, Real)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    pub fn min_x(&self) -> Real {
        self.xs[0]
    }

    pub fn max_x(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    /// True when y never increases by more than `tol` along x.
    pub fn is_non_increasing(&self, tol: Real) -> bool {
        self.ys.windows(2).all(|w| w[1] <= w[0] + tol)
    }

    pub fn within_unit_interval(&self) -> bool {
        self.ys.iter().all(|y| (0.0..=1.0).contains(y))
    }

    /// Linear interpolation of y at `x`.
    pub fn interpolate_y(&self, x: Real) -> CurveResult<Real> {
        let i = self.segment_for(x)?;
        if i + 1 == self.xs.len() {
            return Ok(self.ys[i]);
        }
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        Ok(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }

    /// Interpolation of y at `x` in log-x / log-y space.
    ///
    /// Falls back to linear interpolation on a segment where an endpoint is
    /// not strictly positive.
    pub fn interpolate_y_log_log(&self, x: Real) -> CurveResult<Real> {
        let i = self.segment_for(x)?;
        if i + 1 == self.xs.len() {
            return Ok(self.ys[i]);
        }
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        if x <= 0.0 || x0 <= 0.0 || y0 <= 0.0 || y1 <= 0.0 {
            return self.interpolate_y(x);
        }
        let t = (x.ln() - x0.ln()) / (x1.ln() - x0.ln());
        Ok((y0.ln() + t * (y1.ln() - y0.ln())).exp())
    }

    /// First x (scanning from low x) where the curve crosses `y`,
    /// interpolated in log-x / log-y space.
    ///
    /// Used to read the intensity at a target exceedance probability off a
    /// hazard curve. Errors when `y` lies outside the range of the curve.
    pub fn first_x_at_y_log_log(&self, y: Real) -> CurveResult<Real> {
        if !y.is_finite() {
            return Err(CurveError::NonFinite {
                what: "target y",
                value: y,
            });
        }
        for i in 0..self.xs.len() {
            if self.ys[i] == y {
                return Ok(self.xs[i]);
            }
            if i + 1 == self.xs.len() {
                break;
            }
            let (y0, y1) = (self.ys[i], self.ys[i + 1]);
            let crosses = (y0 - y) * (y1 - y) < 0.0;
            if !crosses {
                continue;
            }
            let (x0, x1) = (self.xs[i], self.xs[i + 1]);
            if x0 > 0.0 && y0 > 0.0 && y1 > 0.0 && y > 0.0 {
                let t = (y.ln() - y0.ln()) / (y1.ln() - y0.ln());
                return Ok((x0.ln() + t * (x1.ln() - x0.ln())).exp());
            }
            let t = (y - y0) / (y1 - y0);
            return Ok(x0 + t * (x1 - x0));
        }
        Err(CurveError::OutOfDomain {
            what: "target y",
            value: y,
        })
    }

    /// Index `i` with xs[i] <= x <= xs[i + 1] (or the last index when x is
    /// exactly the final point).
    fn segment_for(&self, x: Real) -> CurveResult<usize> {
        if !x.is_finite() || x < self.min_x() || x > self.max_x() {
            return Err(CurveError::OutOfDomain { what: "x", value: x });
        }
        let idx = self.xs.partition_point(|&xi| xi <= x);
        Ok(idx.saturating_sub(1))
    }
}

fn validate_xs(xs: &[Real]) -> CurveResult<()> {
    if xs.is_empty() {
        return Err(CurveError::Empty);
    }
    for &x in xs {
        if !x.is_finite() {
            return Err(CurveError::NonFinite { what: "x", value: x });
        }
    }
    for (i, w) in xs.windows(2).enumerate() {
        if w[1] <= w[0] {
            return Err(CurveError::NotIncreasing {
                index: i,
                prev: w[0],
                next: w[1],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hazard_like() -> DiscretizedCurve {
        DiscretizedCurve::from_points(vec![0.01, 0.1, 1.0], vec![0.5, 0.05, 0.005]).unwrap()
    }

    #[test]
    fn rejects_non_increasing_x() {
        let err = DiscretizedCurve::new(vec![0.1, 0.1, 0.2]).unwrap_err();
        assert!(matches!(err, CurveError::NotIncreasing { index: 0, .. }));
        assert!(matches!(
            DiscretizedCurve::new(vec![]),
            Err(CurveError::Empty)
        ));
    }

    #[test]
    fn linear_interpolation() {
        let c = DiscretizedCurve::from_points(vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 20.0]).unwrap();
        assert!((c.interpolate_y(0.5).unwrap() - 5.0).abs() < 1e-12);
        assert!((c.interpolate_y(2.0).unwrap() - 20.0).abs() < 1e-12);
        assert!(c.interpolate_y(2.5).is_err());
    }

    #[test]
    fn log_log_interpolation_is_exact_for_power_laws() {
        // y = 0.005 * x^-1 is a straight line in log-log space
        let c = hazard_like();
        let y = c.interpolate_y_log_log(0.3162277660168379).unwrap();
        assert!((y - 0.005 / 0.3162277660168379).abs() < 1e-12);
    }

    #[test]
    fn first_x_at_y_reads_descending_curve() {
        let c = hazard_like();
        let x = c.first_x_at_y_log_log(0.05).unwrap();
        assert!((x - 0.1).abs() < 1e-12);
        let x = c.first_x_at_y_log_log(0.0158113883008419).unwrap();
        assert!((x - 0.31622776601683794).abs() < 1e-9);
        assert!(matches!(
            c.first_x_at_y_log_log(0.9),
            Err(CurveError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn map_x_round_trips_log_axis() {
        let c = hazard_like();
        let logged = c.map_x(f64::ln).unwrap();
        let back = logged.map_x(f64::exp).unwrap();
        for (a, b) in c.xs().iter().zip(back.xs()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(c.ys(), back.ys());
    }

    #[test]
    fn monotonic_and_bounds_checks() {
        let c = hazard_like();
        assert!(c.is_non_increasing(0.0));
        assert!(c.within_unit_interval());
        let bad = c.with_ys(vec![0.1, 0.2, 1.5]).unwrap();
        assert!(!bad.is_non_increasing(0.0));
        assert!(!bad.within_unit_interval());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn interpolated_values_stay_between_neighbours(
            steps in prop::collection::vec(0.01_f64..1.0, 2..8),
            frac in 0.0_f64..1.0,
        ) {
            let mut xs = Vec::with_capacity(steps.len());
            let mut acc = 0.0;
            for s in &steps {
                acc += s;
                xs.push(acc);
            }
            let ys: Vec<f64> = (0..xs.len()).map(|i| 1.0 / (i as f64 + 1.0)).collect();
            let curve = DiscretizedCurve::from_points(xs.clone(), ys).unwrap();
            let x = xs[0] + frac * (xs[xs.len() - 1] - xs[0]);
            let y = curve.interpolate_y_log_log(x).unwrap();
            prop_assert!(y <= 1.0 + 1e-12);
            prop_assert!(y >= 1.0 / xs.len() as f64 - 1e-12);
        }
    }
}
