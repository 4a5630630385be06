//! Hazard-curve engine.
//!
//! Combines per-rupture conditional exceedance probabilities into a site's
//! exceedance curve. Poisson sources contribute `(1 - q)^C` factors;
//! empirical sources sum `q * C` over their ruptures and contribute
//! `1 - S`. The curve's x values are ln(intensity) levels.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use crate::gmm_set::GmmSet;
use crate::traversal::{
    NonExceedance, accumulate_empirical, for_each_source_in_range, poisson_log_survival,
    rupture_in_range,
};
use qh_core::{CalcProgress, Real};
use qh_curve::DiscretizedCurve;
use qh_model::{
    ForecastModel, GroundMotionModel, IntensityMeasure, OccurrenceModel, Rupture, Site, Truncation,
};
use tracing::{info, warn};

/// Hazard curve for one site and intensity measure.
///
/// `levels` supplies the ln(intensity) x values; its y values are ignored.
pub fn compute_hazard_curve(
    levels: &DiscretizedCurve,
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    imt: &IntensityMeasure,
    config: &CalcConfig,
) -> CalcResult<DiscretizedCurve> {
    single_curve(levels, site, gmms, forecast, imt, config, None)
}

/// As [`compute_hazard_curve`], reporting rupture progress and honouring
/// the stop flag in `progress`.
pub fn compute_hazard_curve_with_progress(
    levels: &DiscretizedCurve,
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    imt: &IntensityMeasure,
    config: &CalcConfig,
    progress: &CalcProgress,
) -> CalcResult<DiscretizedCurve> {
    single_curve(levels, site, gmms, forecast, imt, config, Some(progress))
}

fn single_curve(
    levels: &DiscretizedCurve,
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    imt: &IntensityMeasure,
    config: &CalcConfig,
    progress: Option<&CalcProgress>,
) -> CalcResult<DiscretizedCurve> {
    hazard_curves_impl(site, gmms, forecast, &[(*imt, levels)], config, progress)?
        .into_iter()
        .next()
        .ok_or_else(|| CalcError::Numeric {
            what: "hazard engine returned no curve".to_string(),
        })
}

/// One traversal of the forecast shared by every requested intensity
/// measure: distance filtering, model selection and saturation checks run
/// once per rupture.
pub(crate) fn hazard_curves_impl(
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    targets: &[(IntensityMeasure, &DiscretizedCurve)],
    config: &CalcConfig,
    progress: Option<&CalcProgress>,
) -> CalcResult<Vec<DiscretizedCurve>> {
    config.validate()?;
    if targets.is_empty() {
        return Err(CalcError::config("no intensity measures requested"));
    }
    for (imt, _) in targets {
        gmms.ensure_supports(imt)?;
    }

    info!(
        site = %site.id(),
        sources = forecast.num_sources(),
        imts = targets.len(),
        "hazard curve calculation started"
    );

    let context = || format!("site {}", site.id());
    let truncation = config.truncation;
    let mut accumulators: Vec<NonExceedance> = targets
        .iter()
        .map(|(_, levels)| NonExceedance::new(levels.len()))
        .collect();

    let in_range =
        for_each_source_in_range(forecast, site, config, progress, |source_index, source| {
            let gmm = gmms.for_region(source.tectonic_region())?;
            match source.occurrence() {
                OccurrenceModel::Poisson => {
                    for (rupture_index, rupture) in source.ruptures().iter().enumerate() {
                        if !rupture_in_range(config, site, rupture) {
                            continue;
                        }
                        let ln_survival = poisson_log_survival(
                            rupture.probability(),
                            context,
                            source_index,
                            rupture_index,
                        )?;
                        for ((imt, levels), acc) in targets.iter().zip(accumulators.iter_mut()) {
                            let conditional = gmm.exceed_probabilities_at(
                                site,
                                rupture,
                                imt,
                                truncation,
                                levels.xs(),
                            )?;
                            acc.apply_poisson(ln_survival, &conditional);
                        }
                    }
                }
                OccurrenceModel::Empirical => {
                    let mut sums: Vec<Vec<Real>> = targets
                        .iter()
                        .map(|(_, levels)| vec![0.0; levels.len()])
                        .collect();
                    for rupture in source.ruptures() {
                        if !rupture_in_range(config, site, rupture) {
                            continue;
                        }
                        for ((imt, levels), sum) in targets.iter().zip(sums.iter_mut()) {
                            let conditional = gmm.exceed_probabilities_at(
                                site,
                                rupture,
                                imt,
                                truncation,
                                levels.xs(),
                            )?;
                            accumulate_empirical(sum, rupture.probability(), &conditional);
                        }
                    }
                    for (sum, acc) in sums.iter().zip(accumulators.iter_mut()) {
                        let max = sum.iter().copied().fold(0.0, Real::max);
                        if max > 1.0 {
                            warn!(
                                source = source_index,
                                max, "empirical source probability sum exceeds 1, clamped"
                            );
                        }
                        acc.apply_empirical(sum);
                    }
                }
            }
            Ok(())
        })?;

    let curves = targets
        .iter()
        .zip(accumulators)
        .map(|((_, levels), acc)| levels.with_ys(acc.into_exceedance(in_range > 0)))
        .collect::<Result<Vec<_>, _>>()?;

    info!(site = %site.id(), sources_in_range = in_range, "hazard curve calculation finished");
    Ok(curves)
}

/// Conditional exceedance curve of a single rupture.
pub fn deterministic_hazard_curve(
    levels: &DiscretizedCurve,
    site: &Site,
    rupture: &Rupture,
    gmm: &dyn GroundMotionModel,
    imt: &IntensityMeasure,
    truncation: Truncation,
) -> CalcResult<DiscretizedCurve> {
    truncation.validate()?;
    let mut curve = levels.clone();
    gmm.exceed_probabilities(site, rupture, imt, truncation, &mut curve)?;
    Ok(curve)
}

/// Convert exceedance probabilities over `years` into annual rates,
/// `-ln(1 - p) / years`.
pub fn annualized_rates(curve: &DiscretizedCurve, years: Real) -> CalcResult<DiscretizedCurve> {
    if !(years.is_finite() && years > 0.0) {
        return Err(CalcError::config(format!(
            "time span must be positive (got {years})"
        )));
    }
    let mut rates = Vec::with_capacity(curve.len());
    for &p in curve.ys() {
        if !(0.0..1.0).contains(&p) {
            return Err(CalcError::Numeric {
                what: format!("probability {p} has no finite annual rate"),
            });
        }
        rates.push(-(-p).ln_1p() / years);
    }
    Ok(curve.with_ys(rates)?)
}

/// Probability of at least one exceedance in `years` for a return period.
pub fn probability_from_return_period(return_period: Real, years: Real) -> CalcResult<Real> {
    if !(return_period.is_finite() && return_period > 0.0) {
        return Err(CalcError::config(format!(
            "return period must be positive (got {return_period})"
        )));
    }
    if !(years.is_finite() && years > 0.0) {
        return Err(CalcError::config(format!(
            "time span must be positive (got {years})"
        )));
    }
    Ok(-(-years / return_period).exp_m1())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_period_probabilities() {
        // 10% in 50 years is the 475-year motion
        let p = probability_from_return_period(474.56, 50.0).unwrap();
        assert!((p - 0.1).abs() < 1e-4);
        let p = probability_from_return_period(2475.0, 50.0).unwrap();
        assert!((p - 0.02).abs() < 1e-4);
        assert!(probability_from_return_period(0.0, 50.0).is_err());
    }

    #[test]
    fn annualized_rates_invert_poisson() {
        let curve = DiscretizedCurve::from_points(vec![0.0, 1.0], vec![0.1, 0.0]).unwrap();
        let rates = annualized_rates(&curve, 50.0).unwrap();
        assert!((rates.y(0) - (-(0.9_f64).ln() / 50.0)).abs() < 1e-15);
        assert_eq!(rates.y(1), 0.0);
        let certain = curve.with_ys(vec![1.0, 0.5]).unwrap();
        assert!(annualized_rates(&certain, 50.0).is_err());
    }
}
