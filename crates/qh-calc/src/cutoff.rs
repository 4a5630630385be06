//! Magnitude-dependent distance cutoff.

use crate::error::{CalcError, CalcResult};
use qh_core::Real;
use serde::{Deserialize, Serialize};

/// Step function mapping magnitude to a maximum rupture distance.
///
/// Each step `(m, d)` applies from magnitude `m` up to the next step.
/// Magnitudes below the first step use the first distance. A rupture is
/// excluded when its distance is strictly greater than the cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(Real, Real)>", into = "Vec<(Real, Real)>")]
pub struct MagDistCutoff {
    steps: Vec<(Real, Real)>,
}

impl MagDistCutoff {
    pub fn new(steps: Vec<(Real, Real)>) -> CalcResult<Self> {
        if steps.is_empty() {
            return Err(CalcError::config("magnitude-distance cutoff has no steps"));
        }
        for &(m, d) in &steps {
            if !m.is_finite() || !(d >= 0.0) {
                return Err(CalcError::config(format!(
                    "invalid magnitude-distance step ({m}, {d})"
                )));
            }
        }
        if let Some(w) = steps.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(CalcError::config(format!(
                "cutoff magnitudes must increase ({} then {})",
                w[0].0, w[1].0
            )));
        }
        Ok(Self { steps })
    }

    /// Table used with the California time-dependent forecasts.
    pub fn usgs_default() -> Self {
        Self {
            steps: vec![
                (0.0, 25.0),
                (5.25, 40.0),
                (5.75, 60.0),
                (6.25, 80.0),
                (6.75, 100.0),
                (7.25, 500.0),
            ],
        }
    }

    pub fn steps(&self) -> &[(Real, Real)] {
        &self.steps
    }

    pub fn cutoff_distance(&self, magnitude: Real) -> Real {
        let idx = self.steps.partition_point(|&(m, _)| m <= magnitude);
        self.steps[idx.saturating_sub(1)].1
    }

    pub fn excludes(&self, magnitude: Real, distance: Real) -> bool {
        distance > self.cutoff_distance(magnitude)
    }
}

impl TryFrom<Vec<(Real, Real)>> for MagDistCutoff {
    type Error = CalcError;

    fn try_from(steps: Vec<(Real, Real)>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<MagDistCutoff> for Vec<(Real, Real)> {
    fn from(cutoff: MagDistCutoff) -> Self {
        cutoff.steps
    }
}
