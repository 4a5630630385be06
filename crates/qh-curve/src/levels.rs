//! Intensity-measure level generation.
//!
//! Hazard curves are evaluated on a caller-supplied list of intensity levels.
//! Engines work with the natural log of those levels, so `to_log_curve`
//! produces the x axis the hazard engines expect.

use crate::curve::DiscretizedCurve;
use crate::error::{CurveError, CurveResult};
use qh_core::Real;
use std::fmt;

/// Default PGA levels (g) used by USGS national hazard maps.
pub const USGS_PGA_LEVELS: [Real; 19] = [
    0.005, 0.007, 0.0098, 0.0137, 0.0192, 0.0269, 0.0376, 0.0527, 0.0738, 0.103, 0.145, 0.203,
    0.284, 0.397, 0.556, 0.778, 1.09, 1.52, 2.13,
];

/// Type of level progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    /// Uniformly spaced points
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

/// Definition of a level sweep between two intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct ImlLevels {
    pub start: Real,
    pub end: Real,
    pub num_points: usize,
    pub spacing: Spacing,
}

impl ImlLevels {
    pub fn new(start: Real, end: Real, num_points: usize, spacing: Spacing) -> CurveResult<Self> {
        qh_core::ensure_finite(start, "start level")?;
        qh_core::ensure_finite(end, "end level")?;

        if num_points < 2 {
            return Err(CurveError::InvalidLevels {
                what: "at least 2 points are required".to_string(),
            });
        }
        if end <= start {
            return Err(CurveError::InvalidLevels {
                what: format!("end ({end}) must be greater than start ({start})"),
            });
        }
        if start <= 0.0 {
            return Err(CurveError::InvalidLevels {
                what: format!("intensity levels must be positive (start = {start})"),
            });
        }

        Ok(Self {
            start,
            end,
            num_points,
            spacing,
        })
    }

    /// Generate all points of the sweep.
    pub fn generate_points(&self) -> Vec<Real> {
        match self.spacing {
            Spacing::Linear => self.generate_linear(),
            Spacing::Logarithmic => self.generate_logarithmic(),
        }
    }

    /// Curve whose x axis is ln(level), y initialised to 0.
    pub fn to_log_curve(&self) -> CurveResult<DiscretizedCurve> {
        log_levels(&self.generate_points())
    }

    fn generate_linear(&self) -> Vec<Real> {
        let delta = (self.end - self.start) / (self.num_points - 1) as Real;
        let mut points: Vec<Real> = (0..self.num_points)
            .map(|i| self.start + i as Real * delta)
            .collect();
        // Ensure exact endpoint
        points[self.num_points - 1] = self.end;
        points
    }

    fn generate_logarithmic(&self) -> Vec<Real> {
        let log_start = self.start.ln();
        let log_delta = (self.end.ln() - log_start) / (self.num_points - 1) as Real;
        let mut points: Vec<Real> = (0..self.num_points)
            .map(|i| (log_start + i as Real * log_delta).exp())
            .collect();
        points[self.num_points - 1] = self.end;
        points
    }
}

/// Build a log-intensity curve from linear intensity levels.
pub fn log_levels(levels: &[Real]) -> CurveResult<DiscretizedCurve> {
    if let Some(&bad) = levels.iter().find(|&&l| !(l > 0.0)) {
        return Err(CurveError::InvalidLevels {
            what: format!("intensity levels must be positive (got {bad})"),
        });
    }
    DiscretizedCurve::new(levels.iter().map(|l| l.ln()).collect())
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Logarithmic => write!(f, "Logarithmic"),
        }
    }
}

impl fmt::Display for ImlLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Levels from {} to {} ({} points, {})",
            self.start, self.end, self.num_points, self.spacing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_levels() {
        let levels = ImlLevels::new(0.1, 0.5, 5, Spacing::Linear).unwrap();
        let points = levels.generate_points();
        assert_eq!(points.len(), 5);
        assert!((points[2] - 0.3).abs() < 1e-12);
        assert_eq!(points[4], 0.5);
    }

    #[test]
    fn logarithmic_levels() {
        let levels = ImlLevels::new(0.01, 1.0, 3, Spacing::Logarithmic).unwrap();
        let points = levels.generate_points();
        assert!((points[0] - 0.01).abs() < 1e-15);
        assert!((points[1] - 0.1).abs() < 1e-12);
        assert_eq!(points[2], 1.0);
    }

    #[test]
    fn rejects_bad_definitions() {
        assert!(ImlLevels::new(0.1, 0.5, 1, Spacing::Linear).is_err());
        assert!(ImlLevels::new(0.5, 0.5, 5, Spacing::Linear).is_err());
        assert!(ImlLevels::new(0.0, 0.5, 5, Spacing::Logarithmic).is_err());
    }

    #[test]
    fn log_curve_axis() {
        let curve = log_levels(&USGS_PGA_LEVELS).unwrap();
        assert_eq!(curve.len(), USGS_PGA_LEVELS.len());
        assert!((curve.x(0) - 0.005_f64.ln()).abs() < 1e-12);
        assert!(curve.ys().iter().all(|&y| y == 0.0));
        assert!(log_levels(&[0.1, -0.2]).is_err());
    }
}
