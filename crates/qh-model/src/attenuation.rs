//! Reference attenuation relationship.
//!
//! A compact functional form that gives physically sensible ground motions
//! for testing and demonstration:
//!
//! ```text
//! ln Y = c0 + c1 (M - 6) + c2 (M - 6)^2
//!        - c3 ln sqrt(R^2 + h^2) - c4 R + c5 ln(Vs30 / Vref)
//! ```
//!
//! R is the rupture distance in km. Between tabulated spectral periods the
//! coefficients are interpolated linearly in ln(period). The default table
//! is illustrative and not a published model.

use crate::error::{ModelError, ModelResult};
use crate::gmm::{GmmPrediction, GroundMotionModel, StdDevs};
use crate::imt::IntensityMeasure;
use crate::rupture::Rupture;
use crate::site::Site;
use qh_core::Real;
use serde::{Deserialize, Serialize};

/// Coefficients for one intensity measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttenuationCoefficients {
    pub imt: IntensityMeasure,
    pub c0: Real,
    pub c1: Real,
    pub c2: Real,
    pub c3: Real,
    pub c4: Real,
    pub c5: Real,
    /// Near-source saturation depth (km).
    pub h: Real,
    /// Inter-event standard deviation.
    pub tau: Real,
    /// Intra-event standard deviation.
    pub phi: Real,
}

impl AttenuationCoefficients {
    fn lerp(a: &Self, b: &Self, t: Real, imt: IntensityMeasure) -> Self {
        let l = |x: Real, y: Real| x + t * (y - x);
        Self {
            imt,
            c0: l(a.c0, b.c0),
            c1: l(a.c1, b.c1),
            c2: l(a.c2, b.c2),
            c3: l(a.c3, b.c3),
            c4: l(a.c4, b.c4),
            c5: l(a.c5, b.c5),
            h: l(a.h, b.h),
            tau: l(a.tau, b.tau),
            phi: l(a.phi, b.phi),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAttenuation {
    pub name: String,
    /// Vs30 used when a site carries none, and the reference for scaling (m/s).
    #[serde(default = "default_vs30")]
    pub reference_vs30: Real,
    pub coefficients: Vec<AttenuationCoefficients>,
}

fn default_vs30() -> Real {
    760.0
}

impl Default for ReferenceAttenuation {
    fn default() -> Self {
        let row = |imt, c0, c1, c2, c3, c4, c5, h, tau, phi| AttenuationCoefficients {
            imt,
            c0,
            c1,
            c2,
            c3,
            c4,
            c5,
            h,
            tau,
            phi,
        };
        let sa = |period| IntensityMeasure::Sa { period };
        Self {
            name: "ReferenceAttenuation".to_string(),
            reference_vs30: default_vs30(),
            coefficients: vec![
                row(IntensityMeasure::Pga, 0.88, 0.60, -0.05, 1.00, 0.0030, -0.50, 6.0, 0.35, 0.55),
                row(IntensityMeasure::Pgv, 5.18, 0.90, -0.05, 1.00, 0.0020, -0.60, 6.0, 0.30, 0.55),
                row(sa(0.1), 1.40, 0.55, -0.06, 1.05, 0.0040, -0.40, 6.0, 0.36, 0.58),
                row(sa(0.3), 1.55, 0.65, -0.06, 1.00, 0.0030, -0.55, 6.5, 0.37, 0.60),
                row(sa(1.0), 0.05, 0.95, -0.08, 0.90, 0.0020, -0.75, 7.0, 0.40, 0.62),
                row(sa(3.0), -1.75, 1.20, -0.10, 0.85, 0.0015, -0.80, 8.0, 0.42, 0.63),
            ],
        }
    }
}

impl ReferenceAttenuation {
    /// Tabulated spectral periods in ascending order.
    fn spectral_rows(&self) -> Vec<&AttenuationCoefficients> {
        let mut rows: Vec<_> = self
            .coefficients
            .iter()
            .filter(|c| c.imt.is_spectral())
            .collect();
        rows.sort_by(|a, b| a.imt.period().total_cmp(&b.imt.period()));
        rows
    }

    fn coefficients_for(&self, imt: &IntensityMeasure) -> Option<AttenuationCoefficients> {
        match imt {
            IntensityMeasure::Pga | IntensityMeasure::Pgv => {
                self.coefficients.iter().find(|c| c.imt == *imt).copied()
            }
            IntensityMeasure::Sa { period } => {
                let rows = self.spectral_rows();
                let idx = rows.partition_point(|c| c.imt.period() < *period);
                let hi = rows.get(idx)?;
                if hi.imt.period() == *period {
                    return Some(**hi);
                }
                let lo = rows.get(idx.checked_sub(1)?)?;
                let (p0, p1) = (lo.imt.period().ln(), hi.imt.period().ln());
                let t = (period.ln() - p0) / (p1 - p0);
                Some(AttenuationCoefficients::lerp(lo, hi, t, *imt))
            }
        }
    }
}

impl GroundMotionModel for ReferenceAttenuation {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, imt: &IntensityMeasure) -> bool {
        self.coefficients_for(imt).is_some()
    }

    fn predict(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
    ) -> ModelResult<GmmPrediction> {
        let c = self
            .coefficients_for(imt)
            .ok_or_else(|| ModelError::UnsupportedImt {
                model: self.name.clone(),
                imt: imt.to_string(),
            })?;
        let vs30 = site.params().vs30().unwrap_or(self.reference_vs30);
        if !(vs30 > 0.0) {
            return Err(ModelError::Invalid {
                what: "vs30",
                reason: format!("must be positive (got {vs30})"),
            });
        }

        let dm = rupture.magnitude() - 6.0;
        let r = rupture.distance_to(site);
        let mean = c.c0 + c.c1 * dm + c.c2 * dm * dm - c.c3 * (r * r + c.h * c.h).sqrt().ln()
            - c.c4 * r
            + c.c5 * (vs30 / self.reference_vs30).ln();

        Ok(GmmPrediction {
            mean,
            std: StdDevs::split(c.tau, c.phi),
        })
    }
}
