//! Stochastic event sets and event-set hazard curves.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use crate::gmm_set::GmmSet;
use crate::sampling::poisson_count;
use crate::traversal::{NonExceedance, poisson_log_survival, rupture_in_range};
use qh_core::Real;
use qh_curve::DiscretizedCurve;
use qh_model::{EventSet, ForecastModel, IntensityMeasure, Site};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

/// Hazard curve from a fixed set of realised ruptures.
///
/// Each rupture is certain; the curve is `1 - Π(1 - C)` over ruptures in
/// range, and identically 0 when none is.
pub fn event_set_hazard_curve(
    levels: &DiscretizedCurve,
    site: &Site,
    gmms: &GmmSet,
    events: &EventSet,
    imt: &IntensityMeasure,
    config: &CalcConfig,
) -> CalcResult<DiscretizedCurve> {
    config.validate()?;
    gmms.ensure_supports(imt)?;

    let mut acc = NonExceedance::new(levels.len());
    let mut used = 0usize;
    for rupture in events.ruptures() {
        if !rupture_in_range(config, site, rupture) {
            continue;
        }
        used += 1;
        let gmm = gmms.for_region(rupture.tectonic_region())?;
        let conditional =
            gmm.exceed_probabilities_at(site, rupture, imt, config.truncation, levels.xs())?;
        // certain occurrence: H *= 1 - C
        acc.apply_empirical(&conditional);
    }
    debug!(site = %site.id(), events = events.len(), used, "event-set curve");
    Ok(levels.with_ys(acc.into_exceedance(used > 0))?)
}

/// Draw one realization of the forecast.
///
/// Poisson ruptures occur `N ~ Poisson(-ln(1 - q))` times; ruptures of
/// empirical sources occur once with probability `q`.
pub fn draw_event_set<R: Rng + ?Sized>(
    forecast: &dyn ForecastModel,
    rng: &mut R,
) -> CalcResult<EventSet> {
    let mut events = EventSet::default();
    for (source_index, source) in forecast.sources().enumerate() {
        for (rupture_index, rupture) in source.ruptures().iter().enumerate() {
            let q = rupture.probability();
            if source.is_poissonian() {
                let ln_survival = poisson_log_survival(
                    q,
                    || "event-set draw".to_string(),
                    source_index,
                    rupture_index,
                )?;
                for _ in 0..poisson_count(rng, -ln_survival) {
                    events.push(rupture.clone());
                }
            } else if rng.gen_bool(q) {
                events.push(rupture.clone());
            }
        }
    }
    Ok(events)
}

/// Mean of `num_sets` event-set curves; set `i` is drawn from
/// `StdRng::seed_from_u64(seed + i)`, in parallel.
#[allow(clippy::too_many_arguments)]
pub fn average_event_set_hazard_curve(
    levels: &DiscretizedCurve,
    site: &Site,
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    imt: &IntensityMeasure,
    config: &CalcConfig,
    num_sets: usize,
    seed: u64,
) -> CalcResult<DiscretizedCurve> {
    if num_sets == 0 {
        return Err(CalcError::config("number of event sets must be positive"));
    }
    info!(site = %site.id(), num_sets, seed, "averaging event-set hazard curves");

    let curves = (0..num_sets)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let events = draw_event_set(forecast, &mut rng)?;
            event_set_hazard_curve(levels, site, gmms, &events, imt, config)
        })
        .collect::<CalcResult<Vec<_>>>()?;

    let mut mean = vec![0.0; levels.len()];
    for curve in &curves {
        for (m, &y) in mean.iter_mut().zip(curve.ys()) {
            *m += y;
        }
    }
    let n = num_sets as Real;
    mean.iter_mut().for_each(|m| *m /= n);
    Ok(levels.with_ys(mean)?)
}
