//! Multi-intensity-measure hazard: spectra and Hazus curve sets.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use crate::gmm_set::GmmSet;
use crate::hazard_curve::{hazard_curves_impl, probability_from_return_period};
use qh_core::{CalcProgress, Real};
use qh_curve::{DiscretizedCurve, USGS_PGA_LEVELS, log_levels};
use qh_model::{ForecastModel, GroundMotionModel, IntensityMeasure, Rupture, Site, Truncation};
use serde::Serialize;
use tracing::debug;

/// Hazus return periods (years).
pub const HAZUS_RETURN_PERIODS: [Real; 8] =
    [100.0, 250.0, 500.0, 750.0, 1000.0, 1500.0, 2000.0, 2500.0];

/// Hazus exposure duration (years).
pub const HAZUS_DURATION_YEARS: Real = 50.0;

/// One intensity measure with its ln(intensity) levels.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRequest {
    pub imt: IntensityMeasure,
    pub levels: DiscretizedCurve,
}

/// A completed hazard curve for one intensity measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImtCurve {
    pub imt: IntensityMeasure,
    pub curve: DiscretizedCurve,
}

impl ImtCurve {
    /// Intensity (linear units) exceeded with probability `poe`, read off
    /// the curve in log-log space.
    pub fn iml_at_probability(&self, poe: Real) -> CalcResult<Real> {
        Ok(self.curve.map_x(Real::exp)?.first_x_at_y_log_log(poe)?)
    }

    /// Exceedance probability at a linear intensity `iml`.
    pub fn probability_at_iml(&self, iml: Real) -> CalcResult<Real> {
        Ok(self.curve.map_x(Real::exp)?.interpolate_y_log_log(iml)?)
    }
}

/// Hazard curves for several intensity measures from one forecast traversal.
pub fn compute_hazard_curves(
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    requests: &[CurveRequest],
    config: &CalcConfig,
) -> CalcResult<Vec<ImtCurve>> {
    curves_for(site, gmms, forecast, requests, config, None)
}

pub fn compute_hazard_curves_with_progress(
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    requests: &[CurveRequest],
    config: &CalcConfig,
    progress: &CalcProgress,
) -> CalcResult<Vec<ImtCurve>> {
    curves_for(site, gmms, forecast, requests, config, Some(progress))
}

fn curves_for(
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    requests: &[CurveRequest],
    config: &CalcConfig,
    progress: Option<&CalcProgress>,
) -> CalcResult<Vec<ImtCurve>> {
    let targets: Vec<(IntensityMeasure, &DiscretizedCurve)> =
        requests.iter().map(|r| (r.imt, &r.levels)).collect();
    let curves = hazard_curves_impl(site, gmms, forecast, &targets, config, progress)?;
    Ok(requests
        .iter()
        .zip(curves)
        .map(|(r, curve)| ImtCurve { imt: r.imt, curve })
        .collect())
}

/// Spectral-acceleration curves sorted by period; PGA and PGV are skipped.
fn spectral_curves(curves: &[ImtCurve]) -> Vec<&ImtCurve> {
    let mut sa: Vec<&ImtCurve> = curves.iter().filter(|c| c.imt.is_spectral()).collect();
    sa.sort_by(|a, b| a.imt.period().total_cmp(&b.imt.period()));
    sa
}

fn period_curve(points: Vec<(Real, Real)>) -> CalcResult<DiscretizedCurve> {
    if points.is_empty() {
        return Err(CalcError::config("no spectral-acceleration curves supplied"));
    }
    let (xs, ys) = points.into_iter().unzip();
    Ok(DiscretizedCurve::from_points(xs, ys)?)
}

/// Uniform-hazard spectrum: intensity at `poe` for each SA period
/// (x = period, y = intensity).
pub fn iml_spectrum(curves: &[ImtCurve], poe: Real) -> CalcResult<DiscretizedCurve> {
    let points = spectral_curves(curves)
        .into_iter()
        .map(|c| Ok((c.imt.period(), c.iml_at_probability(poe)?)))
        .collect::<CalcResult<Vec<_>>>()?;
    period_curve(points)
}

/// Exceedance probability at a fixed intensity for each SA period
/// (x = period, y = probability).
pub fn probability_spectrum(curves: &[ImtCurve], iml: Real) -> CalcResult<DiscretizedCurve> {
    let points = spectral_curves(curves)
        .into_iter()
        .map(|c| Ok((c.imt.period(), c.probability_at_iml(iml)?)))
        .collect::<CalcResult<Vec<_>>>()?;
    period_curve(points)
}

/// What a deterministic spectrum reports per period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeterministicTarget {
    /// Conditional exceedance probability at this intensity.
    ProbAtIml(Real),
    /// Intensity exceeded with this conditional probability.
    ImlAtProb(Real),
}

/// Single-rupture spectrum over `periods` (x = period).
pub fn deterministic_spectrum(
    site: &Site,
    rupture: &Rupture,
    gmm: &dyn GroundMotionModel,
    periods: &[Real],
    target: DeterministicTarget,
    truncation: Truncation,
) -> CalcResult<DiscretizedCurve> {
    truncation.validate()?;
    let mut sorted = periods.to_vec();
    sorted.sort_by(Real::total_cmp);
    let mut points = Vec::with_capacity(sorted.len());
    for period in sorted {
        let imt = IntensityMeasure::sa(period)?;
        let value = match target {
            DeterministicTarget::ProbAtIml(iml) => {
                if !(iml > 0.0) {
                    return Err(CalcError::config(format!("intensity must be positive (got {iml})")));
                }
                gmm.exceed_probability(site, rupture, &imt, truncation, iml.ln())?
            }
            DeterministicTarget::ImlAtProb(p) => gmm
                .iml_at_exceed_prob(site, rupture, &imt, truncation, p)?
                .exp(),
        };
        points.push((period, value));
    }
    period_curve(points)
}

/// ln(intensity) levels for the four Hazus intensity measures.
#[derive(Debug, Clone, PartialEq)]
pub struct HazusLevels {
    pub pga: DiscretizedCurve,
    pub pgv: DiscretizedCurve,
    pub sa_03: DiscretizedCurve,
    pub sa_10: DiscretizedCurve,
}

impl HazusLevels {
    /// USGS acceleration levels for PGA and SA; 0.1 to 300 cm/s for PGV.
    pub fn usgs_defaults() -> CalcResult<Self> {
        let accel = log_levels(&USGS_PGA_LEVELS)?;
        let pgv: Vec<Real> = (0..=20)
            .map(|i| 0.1 * (3000.0_f64).powf(i as Real / 20.0))
            .collect();
        Ok(Self {
            pga: accel.clone(),
            pgv: log_levels(&pgv)?,
            sa_03: accel.clone(),
            sa_10: accel,
        })
    }
}

/// Hazard curves for PGA, PGV, SA(0.3) and SA(1.0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazusCurves {
    pub pga: DiscretizedCurve,
    pub pgv: DiscretizedCurve,
    pub sa_03: DiscretizedCurve,
    pub sa_10: DiscretizedCurve,
}

/// Intensities for one return period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HazusRow {
    pub return_period: Real,
    pub probability: Real,
    pub pga: Real,
    pub pgv: Real,
    pub sa_03: Real,
    pub sa_10: Real,
}

pub fn hazus_curves(
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    levels: &HazusLevels,
    config: &CalcConfig,
) -> CalcResult<HazusCurves> {
    let requests = [
        CurveRequest {
            imt: IntensityMeasure::Pga,
            levels: levels.pga.clone(),
        },
        CurveRequest {
            imt: IntensityMeasure::Pgv,
            levels: levels.pgv.clone(),
        },
        CurveRequest {
            imt: IntensityMeasure::Sa { period: 0.3 },
            levels: levels.sa_03.clone(),
        },
        CurveRequest {
            imt: IntensityMeasure::Sa { period: 1.0 },
            levels: levels.sa_10.clone(),
        },
    ];
    let mut curves = compute_hazard_curves(site, gmms, forecast, &requests, config)?
        .into_iter()
        .map(|c| c.curve);
    let mut next = || {
        curves.next().ok_or_else(|| CalcError::Numeric {
            what: "hazard engine returned too few curves".to_string(),
        })
    };
    Ok(HazusCurves {
        pga: next()?,
        pgv: next()?,
        sa_03: next()?,
        sa_10: next()?,
    })
}

impl HazusCurves {
    /// Intensities at each return period over `duration` years. A
    /// probability the curve never reaches reports an intensity of 0.
    pub fn at_return_periods(
        &self,
        return_periods: &[Real],
        duration: Real,
    ) -> CalcResult<Vec<HazusRow>> {
        return_periods
            .iter()
            .map(|&rp| {
                let probability = probability_from_return_period(rp, duration)?;
                Ok(HazusRow {
                    return_period: rp,
                    probability,
                    pga: iml_or_zero(&self.pga, probability)?,
                    pgv: iml_or_zero(&self.pgv, probability)?,
                    sa_03: iml_or_zero(&self.sa_03, probability)?,
                    sa_10: iml_or_zero(&self.sa_10, probability)?,
                })
            })
            .collect()
    }
}

fn iml_or_zero(curve: &DiscretizedCurve, probability: Real) -> CalcResult<Real> {
    match curve.map_x(Real::exp)?.first_x_at_y_log_log(probability) {
        Ok(iml) => Ok(iml),
        Err(err) => {
            debug!(probability, %err, "probability outside hazard curve");
            Ok(0.0)
        }
    }
}
