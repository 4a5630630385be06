//! Ground-motion model capability.
//!
//! A ground-motion model predicts the distribution of ln(intensity) at a
//! site for a rupture: a mean and a total standard deviation, optionally
//! split into inter-event (between-earthquake) and intra-event
//! (within-earthquake) parts.

use crate::error::ModelResult;
use crate::imt::IntensityMeasure;
use crate::rupture::Rupture;
use crate::site::Site;
use crate::truncation::Truncation;
use qh_core::Real;
use qh_curve::DiscretizedCurve;

/// Standard deviations of ln(intensity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StdDevs {
    pub total: Real,
    pub inter: Option<Real>,
    pub intra: Option<Real>,
}

impl StdDevs {
    pub fn total_only(total: Real) -> Self {
        Self {
            total,
            inter: None,
            intra: None,
        }
    }

    /// Total is the root sum of squares of the two parts.
    pub fn split(inter: Real, intra: Real) -> Self {
        Self {
            total: (inter * inter + intra * intra).sqrt(),
            inter: Some(inter),
            intra: Some(intra),
        }
    }

    pub fn has_split(&self) -> bool {
        self.inter.is_some() && self.intra.is_some()
    }
}

/// Predicted distribution of ln(intensity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GmmPrediction {
    pub mean: Real,
    pub std: StdDevs,
}

impl GmmPrediction {
    /// Standardised residual of `ln_iml`.
    pub fn epsilon(&self, ln_iml: Real) -> Real {
        if self.std.total > 0.0 {
            (ln_iml - self.mean) / self.std.total
        } else if ln_iml > self.mean {
            Real::INFINITY
        } else if ln_iml < self.mean {
            Real::NEG_INFINITY
        } else {
            0.0
        }
    }

    /// P(ln Y > ln_iml).
    pub fn exceed_probability(&self, ln_iml: Real, truncation: Truncation) -> Real {
        if self.std.total <= 0.0 {
            return if ln_iml < self.mean { 1.0 } else { 0.0 };
        }
        truncation.exceedance_probability(self.epsilon(ln_iml))
    }

    /// ln(intensity) exceeded with probability `p`.
    pub fn ln_iml_at(&self, p: Real, truncation: Truncation) -> ModelResult<Real> {
        if self.std.total <= 0.0 {
            return Ok(self.mean);
        }
        Ok(self.mean + truncation.epsilon_at(p)? * self.std.total)
    }
}

/// Ground-motion prediction equation.
///
/// Implementations must be stateless with respect to queries; engines call
/// them concurrently from worker threads.
pub trait GroundMotionModel: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, imt: &IntensityMeasure) -> bool;

    /// Mean and standard deviations of ln(intensity). Errors with
    /// `ModelError::UnsupportedImt` when `supports` is false.
    fn predict(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
    ) -> ModelResult<GmmPrediction>;

    /// P(ln Y > ln_iml) for one level.
    fn exceed_probability(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
        truncation: Truncation,
        ln_iml: Real,
    ) -> ModelResult<Real> {
        Ok(self
            .predict(site, rupture, imt)?
            .exceed_probability(ln_iml, truncation))
    }

    /// Exceedance probabilities at every ln level.
    fn exceed_probabilities_at(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
        truncation: Truncation,
        ln_imls: &[Real],
    ) -> ModelResult<Vec<Real>> {
        let pred = self.predict(site, rupture, imt)?;
        Ok(ln_imls
            .iter()
            .map(|&x| pred.exceed_probability(x, truncation))
            .collect())
    }

    /// Overwrite the y values of a curve whose x axis is ln(intensity).
    fn exceed_probabilities(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
        truncation: Truncation,
        curve: &mut DiscretizedCurve,
    ) -> ModelResult<()> {
        let probs = self.exceed_probabilities_at(site, rupture, imt, truncation, curve.xs())?;
        curve.ys_mut().copy_from_slice(&probs);
        Ok(())
    }

    /// ln(intensity) exceeded with probability `p`.
    fn iml_at_exceed_prob(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
        truncation: Truncation,
        p: Real,
    ) -> ModelResult<Real> {
        self.predict(site, rupture, imt)?.ln_iml_at(p, truncation)
    }

    fn epsilon(
        &self,
        site: &Site,
        rupture: &Rupture,
        imt: &IntensityMeasure,
        ln_iml: Real,
    ) -> ModelResult<Real> {
        Ok(self.predict(site, rupture, imt)?.epsilon(ln_iml))
    }
}
