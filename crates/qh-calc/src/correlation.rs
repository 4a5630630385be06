//! Spatial correlation of intra-event residuals.

use crate::error::{CalcError, CalcResult};
use nalgebra::DMatrix;
use qh_core::{Real, horizontal_distance};
use qh_model::Site;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Correlation coefficient between residuals at two sites.
pub trait CorrelationModel: Send + Sync {
    /// Correlation in [0, 1] for a separation (km) and spectral period (s).
    fn correlation(&self, distance: Real, period: Real) -> Real;
}

/// Jayaram & Baker (2009) exponential model, `exp(-3 d / range)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JayaramBaker2009 {
    /// Use the range fitted to regions where Vs30 is spatially clustered.
    pub vs30_clustering: bool,
    /// Zero the correlation beyond `factor * range`.
    pub truncation_factor: Option<Real>,
}

impl JayaramBaker2009 {
    /// Original truncation factor when truncation is enabled.
    pub const DEFAULT_TRUNCATION_FACTOR: Real = 2.0;

    /// Range parameter (km) for a period.
    pub fn range(&self, period: Real) -> Real {
        if period < 1.0 {
            if self.vs30_clustering {
                40.7 - 15.0 * period
            } else {
                8.5 + 17.2 * period
            }
        } else {
            22.0 + 3.7 * period
        }
    }
}

impl CorrelationModel for JayaramBaker2009 {
    fn correlation(&self, distance: Real, period: Real) -> Real {
        let range = self.range(period);
        if let Some(factor) = self.truncation_factor {
            if distance > factor * range {
                return 0.0;
            }
        }
        (-3.0 * distance / range).exp()
    }
}

/// Site-by-site correlation matrix with unit diagonal.
pub fn correlation_matrix(sites: &[Site], model: &dyn CorrelationModel, period: Real) -> DMatrix<Real> {
    let n = sites.len();
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else {
            let d = horizontal_distance(sites[i].location(), sites[j].location());
            model.correlation(d, period)
        }
    })
}

/// Lower-triangular `L` with `L Lᵗ = matrix`.
///
/// Coincident sites make the matrix singular; one retry adds a small
/// diagonal nugget before giving up.
pub fn cholesky_factor(matrix: DMatrix<Real>) -> CalcResult<DMatrix<Real>> {
    const NUGGET: Real = 1e-10;

    if let Some(chol) = matrix.clone().cholesky() {
        return Ok(chol.l());
    }
    let n = matrix.nrows();
    let jittered = matrix + DMatrix::identity(n, n) * NUGGET;
    match jittered.cholesky() {
        Some(chol) => {
            warn!(size = n, nugget = NUGGET, "correlation matrix regularised before factorisation");
            Ok(chol.l())
        }
        None => Err(CalcError::Numeric {
            what: format!("{n}x{n} correlation matrix is not positive definite"),
        }),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn correlation_in_unit_interval(d in 0.0_f64..500.0, t in 0.0_f64..5.0, clustered: bool) {
            let jb = JayaramBaker2009 { vs30_clustering: clustered, truncation_factor: None };
            let rho = jb.correlation(d, t);
            prop_assert!((0.0..=1.0).contains(&rho));
        }
    }
}
