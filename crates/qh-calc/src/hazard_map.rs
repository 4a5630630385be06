//! Hazard curves over a list of sites, computed in parallel.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use crate::gmm_set::GmmSet;
use crate::hazard_curve::compute_hazard_curve;
use qh_core::{Location, Real, SiteId};
use qh_curve::DiscretizedCurve;
use qh_model::{ForecastModel, IntensityMeasure, Site};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteCurve {
    pub site_id: SiteId,
    pub lat: Real,
    pub lon: Real,
    pub curve: DiscretizedCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardMap {
    pub imt: IntensityMeasure,
    pub curves: Vec<SiteCurve>,
}

impl HazardMap {
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Intensity at `poe` per site; `None` where the curve never crosses it.
    pub fn iml_at_probability(&self, poe: Real) -> CalcResult<Vec<Option<Real>>> {
        self.curves
            .iter()
            .map(|sc| Ok(sc.curve.map_x(Real::exp)?.first_x_at_y_log_log(poe).ok()))
            .collect()
    }

    /// Exceedance probability at a linear intensity per site.
    pub fn probability_at_iml(&self, iml: Real) -> CalcResult<Vec<Real>> {
        self.curves
            .iter()
            .map(|sc| Ok(sc.curve.map_x(Real::exp)?.interpolate_y_log_log(iml)?))
            .collect()
    }
}

/// One hazard curve per site. Sites are independent, so each runs on its
/// own rayon task; the first error aborts the map.
pub fn compute_hazard_map(
    levels: &DiscretizedCurve,
    sites: &[Site],
    gmms: &GmmSet,
    forecast: &dyn ForecastModel,
    imt: &IntensityMeasure,
    config: &CalcConfig,
) -> CalcResult<HazardMap> {
    if sites.is_empty() {
        return Err(CalcError::config("site list is empty"));
    }
    info!(sites = sites.len(), %imt, "hazard map started");

    let curves = sites
        .par_iter()
        .map(|site| {
            let curve = compute_hazard_curve(levels, site, gmms, forecast, imt, config)?;
            let loc: &Location = site.location();
            Ok(SiteCurve {
                site_id: site.id(),
                lat: loc.lat(),
                lon: loc.lon(),
                curve,
            })
        })
        .collect::<CalcResult<Vec<_>>>()?;

    info!(sites = curves.len(), "hazard map finished");
    Ok(HazardMap { imt: *imt, curves })
}
