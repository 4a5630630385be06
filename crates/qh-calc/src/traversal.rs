//! Source/rupture traversal shared by the hazard engines.
//!
//! Every engine walks the forecast the same way: sources in order, the stop
//! flag checked before each source, the per-source distance filter applied
//! before any per-rupture work, and the progress counter advanced by the
//! source's full rupture count whether or not the source was used.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use qh_core::{CalcProgress, Real, clamp_probability};
use qh_model::{ForecastModel, Rupture, Site, Source};
use tracing::debug;

/// Ruptures with `ln(1 - q)` below this are rejected as saturated.
pub const SATURATION_LOG_LIMIT: Real = -30.0;

/// Visit every source within `config.max_distance` of `site`.
///
/// Returns the number of sources visited.
pub(crate) fn for_each_source_in_range<F>(
    forecast: &dyn ForecastModel,
    site: &Site,
    config: &CalcConfig,
    progress: Option<&CalcProgress>,
    mut visit: F,
) -> CalcResult<usize>
where
    F: FnMut(usize, &Source) -> CalcResult<()>,
{
    if let Some(p) = progress {
        p.reset(forecast.total_ruptures());
    }

    let num_sources = forecast.num_sources();
    let mut in_range = 0;
    for index in 0..num_sources {
        if progress.is_some_and(CalcProgress::is_stop_requested) {
            debug!(completed_sources = index, "stop requested");
            return Err(CalcError::Cancelled {
                completed_sources: index,
            });
        }
        let source = forecast.source(index).ok_or_else(|| {
            CalcError::config(format!(
                "forecast '{}' reports {num_sources} sources but source {index} is missing",
                forecast.name()
            ))
        })?;

        let distance = source.min_distance(site);
        if distance <= config.max_distance {
            in_range += 1;
            visit(index, source)?;
        } else {
            debug!(source = index, distance, "source beyond max distance");
        }

        if let Some(p) = progress {
            p.advance(source.num_ruptures());
        }
    }
    Ok(in_range)
}

/// Per-rupture filters: max distance and the optional magnitude cutoff.
pub(crate) fn rupture_in_range(config: &CalcConfig, site: &Site, rupture: &Rupture) -> bool {
    let distance = rupture.jb_distance_to(site);
    if distance > config.max_distance {
        return false;
    }
    match &config.mag_dist_cutoff {
        Some(cutoff) => !cutoff.excludes(rupture.magnitude(), distance),
        None => true,
    }
}

/// `ln(1 - q)`, or a saturation error naming the rupture.
pub(crate) fn poisson_log_survival(
    probability: Real,
    context: impl FnOnce() -> String,
    source_index: usize,
    rupture_index: usize,
) -> CalcResult<Real> {
    let ln_survival = (-probability).ln_1p();
    if ln_survival.is_nan() || ln_survival < SATURATION_LOG_LIMIT {
        return Err(CalcError::Saturation {
            context: context(),
            source_index,
            rupture_index,
            probability,
        });
    }
    Ok(ln_survival)
}

/// Product-form accumulator `H`, one value per intensity level.
#[derive(Debug, Clone)]
pub(crate) struct NonExceedance {
    h: Vec<Real>,
}

impl NonExceedance {
    pub fn new(len: usize) -> Self {
        Self { h: vec![1.0; len] }
    }

    /// `H *= (1 - q)^C`, with `ln(1 - q)` precomputed.
    pub fn apply_poisson(&mut self, ln_survival: Real, conditional: &[Real]) {
        for (h, &c) in self.h.iter_mut().zip(conditional) {
            *h *= (c * ln_survival).exp();
        }
    }

    /// `H *= 1 - S` for an empirical source's summed probabilities.
    pub fn apply_empirical(&mut self, summed: &[Real]) {
        for (h, &s) in self.h.iter_mut().zip(summed) {
            *h *= 1.0 - clamp_probability(s);
        }
    }

    /// `1 - H`, or identically 0 when no source was in range.
    pub fn into_exceedance(self, any_in_range: bool) -> Vec<Real> {
        if !any_in_range {
            return vec![0.0; self.h.len()];
        }
        self.h.into_iter().map(|h| clamp_probability(1.0 - h)).collect()
    }
}

/// Add `q * c` into an empirical source sum.
pub(crate) fn accumulate_empirical(sum: &mut [Real], probability: Real, conditional: &[Real]) {
    for (s, &c) in sum.iter_mut().zip(conditional) {
        *s += probability * c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisson_factor_matches_power_form() {
        let mut acc = NonExceedance::new(2);
        let ln_s = poisson_log_survival(0.01, String::new, 0, 0).unwrap();
        acc.apply_poisson(ln_s, &[0.5, 0.0]);
        let out = acc.into_exceedance(true);
        assert!((out[0] - (1.0 - 0.99_f64.powf(0.5))).abs() < 1e-15);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn certain_rupture_saturates() {
        let err = poisson_log_survival(1.0, || "site 0".to_string(), 2, 5).unwrap_err();
        assert!(matches!(
            err,
            CalcError::Saturation {
                source_index: 2,
                rupture_index: 5,
                ..
            }
        ));
        // just inside the limit
        let q = 1.0 - (-30.0_f64).exp();
        assert!(poisson_log_survival(q * 0.999_999, String::new, 0, 0).is_ok());
    }

    #[test]
    fn empty_range_is_explicit_zero() {
        let acc = NonExceedance::new(3);
        assert_eq!(acc.into_exceedance(false), vec![0.0; 3]);
    }

    #[test]
    fn empirical_sum_is_clamped() {
        let mut acc = NonExceedance::new(1);
        acc.apply_empirical(&[1.4]);
        assert_eq!(acc.into_exceedance(true), vec![1.0]);
    }

    #[test]
    fn nan_empirical_sum_contributes_nothing() {
        let mut acc = NonExceedance::new(2);
        acc.apply_empirical(&[f64::NAN, 0.25]);
        assert_eq!(acc.into_exceedance(true), vec![0.0, 0.25]);
    }
}
