//! Conversion of a validated scenario into model and engine objects.

use crate::schema::{
    BinsDef, DisaggDef, DisaggTargetDef, GmfDef, GmmDef, LevelValuesDef, LevelsDef, ModelDef,
    RuptureDef, Scenario, SitesDef, SurfaceDef,
};
use crate::validate::parse_imt;
use crate::{ProjectError, ProjectResult};
use qh_calc::{BinAxis, CalcConfig, CurveRequest, DisaggBins, DisaggTarget, GmfOptions, GmmSet};
use qh_core::{Location, SiteId, SourceId};
use qh_curve::{DiscretizedCurve, ImlLevels, Spacing, log_levels};
use qh_model::{
    Forecast, GroundMotionModel, IntensityMeasure, ReferenceAttenuation, Rupture,
    RuptureSurface, Site, SiteParams, Source, TectonicRegion,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn site_params(params: &BTreeMap<String, f64>) -> SiteParams {
    let mut out = SiteParams::new();
    for (key, &value) in params {
        out.set(key.clone(), value);
    }
    out
}

/// Grid coordinates along one axis, inclusive of `max` within rounding.
fn grid_axis(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    let count = ((max - min) / spacing + 1e-9).floor() as usize + 1;
    (0..count).map(|i| min + i as f64 * spacing).collect()
}

/// Sites in scenario order; ids are their 0-based positions.
pub fn build_sites(sites: &SitesDef) -> ProjectResult<Vec<Site>> {
    match sites {
        SitesDef::List { sites } => sites
            .iter()
            .enumerate()
            .map(|(i, s)| -> ProjectResult<Site> {
                let location = Location::surface(s.lat, s.lon)?;
                Ok(Site::new(SiteId::from_index(i as u32), location).with_params(site_params(&s.params)))
            })
            .collect(),
        SitesDef::Grid {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            spacing_deg,
            params,
        } => {
            let params = site_params(params);
            let lons = grid_axis(*min_lon, *max_lon, *spacing_deg);
            let mut out = Vec::new();
            for lat in grid_axis(*min_lat, *max_lat, *spacing_deg) {
                for &lon in &lons {
                    let id = SiteId::from_index(out.len() as u32);
                    let location = Location::surface(lat, lon)?;
                    out.push(Site::new(id, location).with_params(params.clone()));
                }
            }
            Ok(out)
        }
    }
}

/// Human-readable labels matching `build_sites` order.
pub fn site_labels(sites: &SitesDef) -> Vec<String> {
    match sites {
        SitesDef::List { sites } => sites.iter().map(|s| s.name.clone()).collect(),
        SitesDef::Grid {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            spacing_deg,
            ..
        } => {
            let lons = grid_axis(*min_lon, *max_lon, *spacing_deg);
            grid_axis(*min_lat, *max_lat, *spacing_deg)
                .into_iter()
                .flat_map(|lat| lons.iter().map(move |lon| format!("{lat:.4},{lon:.4}")))
                .collect()
        }
    }
}

pub fn build_rupture(rupture: &RuptureDef) -> ProjectResult<Rupture> {
    let surface = match &rupture.surface {
        SurfaceDef::Point { lat, lon, depth } => {
            RuptureSurface::Point(Location::new(*lat, *lon, *depth)?)
        }
        SurfaceDef::Gridded { points } => RuptureSurface::gridded(
            points
                .iter()
                .map(|&[lat, lon, depth]| Location::new(lat, lon, depth))
                .collect::<Result<Vec<_>, _>>()?,
        )?,
    };
    Ok(Rupture::new(
        rupture.magnitude,
        rupture.rake,
        surface,
        rupture.probability,
    )?)
}

pub fn build_forecast(scenario: &Scenario) -> ProjectResult<Forecast> {
    let sources = scenario
        .sources
        .iter()
        .enumerate()
        .map(|(i, s)| -> ProjectResult<Source> {
            let ruptures = s
                .ruptures
                .iter()
                .map(build_rupture)
                .collect::<ProjectResult<Vec<_>>>()?;
            Ok(Source::new(
                SourceId::from_index(i as u32),
                s.name.clone(),
                s.region,
                s.occurrence,
                ruptures,
            ))
        })
        .collect::<ProjectResult<Vec<_>>>()?;
    Ok(Forecast::new(
        scenario.name.clone(),
        scenario.time_span_years,
        sources,
    )?)
}

fn build_model(model: &ModelDef) -> ReferenceAttenuation {
    match model {
        ModelDef::Reference {
            name,
            reference_vs30,
            coefficients,
        } => {
            let mut gmm = ReferenceAttenuation::default();
            if let Some(name) = name {
                gmm.name = name.clone();
            }
            if let Some(vs30) = reference_vs30 {
                gmm.reference_vs30 = *vs30;
            }
            if let Some(rows) = coefficients {
                gmm.coefficients = rows.clone();
            }
            gmm
        }
    }
}

pub fn build_gmm(gmm: &GmmDef) -> ProjectResult<GmmSet> {
    if gmm.by_region.is_empty() {
        let model = gmm.model.clone().unwrap_or_default();
        return Ok(GmmSet::single(build_model(&model)));
    }
    let mut models: BTreeMap<TectonicRegion, Arc<dyn GroundMotionModel>> = gmm
        .by_region
        .iter()
        .map(|(&region, def)| (region, Arc::new(build_model(def)) as Arc<dyn GroundMotionModel>))
        .collect();
    if let Some(fallback) = &gmm.model {
        let shared: Arc<dyn GroundMotionModel> = Arc::new(build_model(fallback));
        for region in TectonicRegion::ALL {
            models.entry(region).or_insert_with(|| Arc::clone(&shared));
        }
    }
    Ok(GmmSet::by_region(models)?)
}

pub fn build_calc_config(scenario: &Scenario) -> ProjectResult<CalcConfig> {
    scenario.calc.validate()?;
    Ok(scenario.calc.clone())
}

/// ln(intensity) axis for one levels entry.
pub fn build_levels(levels: &LevelsDef) -> ProjectResult<(IntensityMeasure, DiscretizedCurve)> {
    let imt = parse_imt(&levels.imt, "levels imt")?;
    let curve = match &levels.values {
        LevelValuesDef::Explicit(values) => log_levels(values)?,
        LevelValuesDef::Sweep {
            start,
            end,
            num_points,
            logarithmic,
        } => {
            let spacing = if *logarithmic {
                Spacing::Logarithmic
            } else {
                Spacing::Linear
            };
            ImlLevels::new(*start, *end, *num_points, spacing)?.to_log_curve()?
        }
    };
    Ok((imt, curve))
}

pub fn build_curve_requests(scenario: &Scenario) -> ProjectResult<Vec<CurveRequest>> {
    scenario
        .levels
        .iter()
        .map(|l| build_levels(l).map(|(imt, levels)| CurveRequest { imt, levels }))
        .collect()
}

/// Levels for `imt`, if the scenario lists any.
pub fn levels_for(
    scenario: &Scenario,
    imt: &IntensityMeasure,
) -> ProjectResult<Option<DiscretizedCurve>> {
    for request in build_curve_requests(scenario)? {
        if request.imt == *imt {
            return Ok(Some(request.levels));
        }
    }
    Ok(None)
}

pub fn build_bin_axes(bins: &BinsDef) -> ProjectResult<DisaggBins> {
    Ok(DisaggBins {
        lat: BinAxis::new(bins.lat.clone())?,
        lon: BinAxis::new(bins.lon.clone())?,
        magnitude: BinAxis::new(bins.magnitude.clone())?,
        distance: BinAxis::new(bins.distance.clone())?,
        epsilon: BinAxis::new(bins.epsilon.clone())?,
    })
}

pub fn build_disagg_target(scenario: &Scenario, disagg: &DisaggDef) -> ProjectResult<DisaggTarget> {
    match disagg.target {
        DisaggTargetDef::Iml { value } => Ok(DisaggTarget::Iml(value)),
        DisaggTargetDef::Poe { value } => {
            let imt = parse_imt(&disagg.imt, "disagg imt")?;
            let levels = levels_for(scenario, &imt)?.ok_or_else(|| ProjectError::Missing {
                what: format!("levels for {imt}"),
            })?;
            Ok(DisaggTarget::Probability { poe: value, levels })
        }
    }
}

/// Scenario rupture (tagged with its region) and generator options.
pub fn build_gmf(gmf: &GmfDef) -> ProjectResult<(IntensityMeasure, Rupture, GmfOptions)> {
    let imt = parse_imt(&gmf.imt, "gmf imt")?;
    let rupture = build_rupture(&gmf.rupture)?.with_tectonic_region(gmf.region);
    let options = GmfOptions {
        include_inter_event: gmf.include_inter_event,
        spatial_correlation: gmf.correlation,
        truncation: gmf.truncation,
    };
    Ok((imt, rupture, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_includes_both_edges() {
        let axis = grid_axis(0.0, 0.3, 0.1);
        assert_eq!(axis.len(), 4);
        assert!((axis[3] - 0.3).abs() < 1e-12);
        assert_eq!(grid_axis(1.0, 1.0, 0.5), vec![1.0]);
    }

    #[test]
    fn grid_sites_are_row_major_from_the_south_west() {
        let sites = SitesDef::Grid {
            min_lat: 10.0,
            max_lat: 10.5,
            min_lon: 20.0,
            max_lon: 21.0,
            spacing_deg: 0.5,
            params: BTreeMap::from([("vs30".to_string(), 400.0)]),
        };
        let built = build_sites(&sites).unwrap();
        assert_eq!(built.len(), 6);
        assert_eq!(built[1].location().lon(), 20.5);
        assert_eq!(built[3].location().lat(), 10.5);
        assert_eq!(built[5].id().index(), 5);
        assert_eq!(built[0].params().vs30(), Some(400.0));
        assert_eq!(site_labels(&sites)[4], "10.5000,20.5000");
    }

    #[test]
    fn regional_models_fall_back_to_default() {
        let gmm = GmmDef {
            model: Some(ModelDef::default()),
            by_region: BTreeMap::from([(
                TectonicRegion::SubductionInterface,
                ModelDef::Reference {
                    name: Some("interface".to_string()),
                    reference_vs30: None,
                    coefficients: None,
                },
            )]),
        };
        let set = build_gmm(&gmm).unwrap();
        assert_eq!(
            set.for_region(TectonicRegion::SubductionInterface)
                .unwrap()
                .name(),
            "interface"
        );
        assert_eq!(
            set.for_region(TectonicRegion::Volcanic).unwrap().name(),
            "ReferenceAttenuation"
        );

        let mut strict = gmm;
        strict.model = None;
        strict
            .by_region
            .insert(TectonicRegion::SubductionIntraslab, ModelDef::default());
        let set = build_gmm(&strict).unwrap();
        assert!(set.for_region(TectonicRegion::Volcanic).is_err());
    }
}
